//! Cursor over materialized elements.

use crate::error::{IonError, Result};
use crate::model::{Decimal, Element, Int, IonType, SymbolToken, Timestamp, Value};
use crate::reader::{IonReader, Span};

#[derive(Debug, Clone, Copy)]
enum Children<'a> {
    Seq(&'a [Element]),
    Fields(&'a [(SymbolToken, Element)]),
}

impl<'a> Children<'a> {
    fn len(&self) -> usize {
        match self {
            Children::Seq(items) => items.len(),
            Children::Fields(fields) => fields.len(),
        }
    }

    fn get(&self, index: usize) -> Option<(Option<&'a SymbolToken>, &'a Element)> {
        match *self {
            Children::Seq(items) => items.get(index).map(|e| (None, e)),
            Children::Fields(fields) => fields.get(index).map(|(k, v)| (Some(k), v)),
        }
    }
}

#[derive(Debug, Clone)]
struct Level<'a> {
    children: Children<'a>,
    next: usize,
    in_struct: bool,
}

/// [`IonReader`] over a borrowed slice of elements.
///
/// The elements cannot change while the cursor borrows them. Spans are not
/// available since tree values have no byte position.
#[derive(Debug, Clone)]
pub struct TreeReader<'a> {
    levels: Vec<Level<'a>>,
    current: Option<(Option<&'a SymbolToken>, &'a Element)>,
    step_into_null_containers: bool,
}

impl<'a> TreeReader<'a> {
    pub fn new(elements: &'a [Element]) -> Self {
        Self {
            levels: vec![Level {
                children: Children::Seq(elements),
                next: 0,
                in_struct: false,
            }],
            current: None,
            step_into_null_containers: true,
        }
    }

    /// Whether stepping into a null container behaves as an empty one.
    pub fn step_into_null_containers(mut self, enabled: bool) -> Self {
        self.step_into_null_containers = enabled;
        self
    }

    /// The element under the cursor.
    pub fn current_element(&self) -> Option<&'a Element> {
        self.current.map(|(_, e)| e)
    }

    fn level(&self) -> &Level<'a> {
        // The top level is never popped.
        &self.levels[self.levels.len() - 1]
    }

    fn element(&self) -> Result<&'a Element> {
        self.current_element()
            .ok_or(IonError::InvalidState("no current value"))
    }
}

/// Error for an accessor expecting `ion_type` on `value`.
fn mismatch(value: &Value, ion_type: IonType, expected: &'static str) -> IonError {
    match value {
        Value::Null(t) if *t == ion_type => IonError::NullValue { ion_type },
        other => IonError::WrongType {
            expected,
            found: other.ion_type(),
        },
    }
}

impl<'a> IonReader for TreeReader<'a> {
    fn next(&mut self) -> Result<Option<IonType>> {
        let last = self.levels.len() - 1;
        let level = &mut self.levels[last];
        self.current = level.children.get(level.next);
        if self.current.is_some() {
            level.next += 1;
        }
        Ok(self.current.map(|(_, e)| e.ion_type()))
    }

    fn has_next(&mut self) -> Result<bool> {
        let level = self.level();
        Ok(level.next < level.children.len())
    }

    fn step_in(&mut self) -> Result<()> {
        let element = self.element()?;
        let children = match &element.value {
            Value::List(items) | Value::SExp(items) => Children::Seq(items),
            Value::Struct(fields) => Children::Fields(fields),
            Value::Null(t) if t.is_container() => {
                if !self.step_into_null_containers {
                    return Err(IonError::InvalidState("cannot step into a null container"));
                }
                Children::Seq(&[])
            }
            _ => return Err(IonError::InvalidState("current value is not a container")),
        };
        self.levels.push(Level {
            children,
            next: 0,
            in_struct: element.ion_type() == IonType::Struct,
        });
        self.current = None;
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        if self.levels.len() == 1 {
            return Err(IonError::InvalidState("step_out at top level"));
        }
        self.levels.pop();
        self.current = None;
        Ok(())
    }

    fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    fn ion_type(&self) -> Result<IonType> {
        Ok(self.element()?.ion_type())
    }

    fn is_null(&self) -> Result<bool> {
        Ok(self.element()?.is_null())
    }

    fn is_in_struct(&self) -> bool {
        self.level().in_struct
    }

    fn field_name(&self) -> Result<Option<SymbolToken>> {
        let (name, _) = self
            .current
            .ok_or(IonError::InvalidState("no current value"))?;
        Ok(name.cloned())
    }

    fn annotations(&self) -> Result<Vec<SymbolToken>> {
        Ok(self.element()?.annotations.clone())
    }

    fn bool_value(&self) -> Result<bool> {
        match &self.element()?.value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(other, IonType::Bool, "a bool")),
        }
    }

    fn int_value(&self) -> Result<Int> {
        match &self.element()?.value {
            Value::Int(i) => Ok(i.clone()),
            other => Err(mismatch(other, IonType::Int, "an int")),
        }
    }

    fn f64_value(&self) -> Result<f64> {
        match &self.element()?.value {
            Value::Float(f) => Ok(*f),
            other => Err(mismatch(other, IonType::Float, "a float")),
        }
    }

    fn decimal_value(&self) -> Result<Decimal> {
        match &self.element()?.value {
            Value::Decimal(d) => Ok(d.clone()),
            other => Err(mismatch(other, IonType::Decimal, "a decimal")),
        }
    }

    fn timestamp_value(&self) -> Result<Timestamp> {
        match &self.element()?.value {
            Value::Timestamp(t) => Ok(t.clone()),
            other => Err(mismatch(other, IonType::Timestamp, "a timestamp")),
        }
    }

    fn string_value(&self) -> Result<&str> {
        let element = self.element()?;
        match &element.value {
            Value::String(s) => Ok(s),
            Value::Symbol(token) => token.as_text().ok_or(IonError::UnknownSymbolText {
                sid: token.as_sid().unwrap_or(0),
            }),
            Value::Null(t) if t.is_text() => Err(IonError::NullValue { ion_type: *t }),
            other => Err(IonError::WrongType {
                expected: "a string or symbol",
                found: other.ion_type(),
            }),
        }
    }

    fn symbol_value(&self) -> Result<SymbolToken> {
        match &self.element()?.value {
            Value::Symbol(token) => Ok(token.clone()),
            other => Err(mismatch(other, IonType::Symbol, "a symbol")),
        }
    }

    fn lob_value(&self) -> Result<&[u8]> {
        let element = self.element()?;
        match &element.value {
            Value::Clob(bytes) | Value::Blob(bytes) => Ok(bytes),
            Value::Null(t) if t.is_lob() => Err(IonError::NullValue { ion_type: *t }),
            other => Err(IonError::WrongType {
                expected: "a clob or blob",
                found: other.ion_type(),
            }),
        }
    }

    fn current_span(&self) -> Result<Span> {
        self.element()?;
        Err(IonError::InvalidState("tree values have no byte span"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    fn sample() -> Vec<Element> {
        vec![
            Element::from_fields([
                ("name", Element::from("x")),
                ("tags", Element::list([Element::symbol("a"), Element::null(IonType::Int)])),
            ]),
            Element::from(5i64).with_annotations(["count"]),
            Element::null(IonType::List),
        ]
    }

    #[test]
    fn test_read_all_reproduces_elements() {
        let elements = sample();
        let mut reader = TreeReader::new(&elements);
        assert_eq!(Element::read_all(&mut reader).unwrap(), elements);
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn test_struct_navigation() {
        let elements = sample();
        let mut reader = TreeReader::new(&elements);
        reader.next().unwrap();
        reader.step_in().unwrap();
        assert!(reader.is_in_struct());
        assert_eq!(reader.depth(), 1);

        assert_eq!(reader.next().unwrap(), Some(IonType::String));
        assert_eq!(reader.field_name().unwrap(), Some(SymbolToken::text("name")));
        assert_eq!(reader.string_value().unwrap(), "x");

        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        reader.step_in().unwrap();
        assert!(!reader.is_in_struct());
        reader.next().unwrap();
        assert_eq!(reader.string_value().unwrap(), "a");
        reader.next().unwrap();
        assert_eq!(
            reader.int_value().unwrap_err(),
            IonError::NullValue { ion_type: IonType::Int }
        );
        reader.step_out().unwrap();
        reader.step_out().unwrap();

        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.annotations().unwrap(), vec![SymbolToken::text("count")]);
        assert_eq!(reader.i64_value().unwrap(), 5);
        assert_eq!(reader.current_span().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_null_container_policy() {
        let elements = vec![Element::null(IonType::Struct)];

        let mut reader = TreeReader::new(&elements);
        reader.next().unwrap();
        reader.step_in().unwrap();
        assert_eq!(reader.next().unwrap(), None);
        reader.step_out().unwrap();

        let mut strict = TreeReader::new(&elements).step_into_null_containers(false);
        strict.next().unwrap();
        assert_eq!(strict.step_in().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_unknown_symbol_text() {
        let elements = vec![Element::symbol(SymbolToken::sid(12))];
        let mut reader = TreeReader::new(&elements);
        reader.next().unwrap();
        assert_eq!(
            reader.string_value().unwrap_err(),
            IonError::UnknownSymbolText { sid: 12 }
        );
        assert_eq!(reader.symbol_value().unwrap().as_sid(), Some(12));
    }

    #[test]
    fn test_step_out_at_top_level() {
        let elements = sample();
        let mut reader = TreeReader::new(&elements);
        assert_eq!(reader.step_out().unwrap_err().kind(), ErrorKind::InvalidState);
        reader.next().unwrap();
        reader.next().unwrap();
        assert_eq!(reader.step_in().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_ion_type_needs_a_current_value() {
        let elements = vec![Element::from("only")];
        let mut reader = TreeReader::new(&elements);
        assert_eq!(reader.ion_type().unwrap_err().kind(), ErrorKind::InvalidState);
        reader.next().unwrap();
        assert_eq!(reader.ion_type().unwrap(), IonType::String);
        assert_eq!(reader.next().unwrap(), None);
        assert_eq!(reader.ion_type().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    proptest! {
        #[test]
        fn prop_lookahead_idempotence(values in proptest::collection::vec(any::<i64>(), 0..16), peeks in 1usize..4) {
            let elements: Vec<Element> = values.iter().copied().map(Element::from).collect();
            let mut reader = TreeReader::new(&elements);
            for v in &values {
                for _ in 0..peeks {
                    prop_assert!(reader.has_next().unwrap());
                }
                prop_assert_eq!(reader.next().unwrap(), Some(IonType::Int));
                prop_assert_eq!(reader.i64_value().unwrap(), *v);
            }
            prop_assert!(!reader.has_next().unwrap());
            prop_assert_eq!(reader.next().unwrap(), None);
        }

        #[test]
        fn prop_depth_symmetry(depth in 0usize..16) {
            let mut element = Element::from(0i64);
            for _ in 0..depth {
                element = Element::sexp([element]);
            }
            let elements = vec![element];
            let mut reader = TreeReader::new(&elements);
            reader.next().unwrap();
            for d in 0..depth {
                prop_assert_eq!(reader.depth(), d);
                reader.step_in().unwrap();
                reader.next().unwrap();
            }
            for d in (0..depth).rev() {
                reader.step_out().unwrap();
                prop_assert_eq!(reader.depth(), d);
            }
            prop_assert_eq!(reader.next().unwrap(), None);
        }
    }
}
