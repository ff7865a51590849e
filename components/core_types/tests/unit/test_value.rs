//! Unit tests for Value enum

use core_types::{ObjectId, PrimitiveKind, Value};

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_smi_bounds() {
        assert!(matches!(Value::Smi(i32::MAX), Value::Smi(n) if n == i32::MAX));
        assert!(matches!(Value::Smi(i32::MIN), Value::Smi(n) if n == i32::MIN));
    }

    #[test]
    fn test_value_heap_object() {
        let val = Value::HeapObject(ObjectId(42));
        assert_eq!(val.as_object(), Some(ObjectId(42)));
        assert_eq!(Value::Smi(42).as_object(), None);
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from("abc"), Value::String("abc".to_string()));
        assert_eq!(Value::from(7), Value::Smi(7));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(ObjectId(1)), Value::HeapObject(ObjectId(1)));
    }
}

#[cfg(test)]
mod value_is_truthy_tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Smi(0).is_truthy());
        assert!(!Value::Double(-0.0).is_truthy());
        assert!(!Value::Double(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
    }

    #[test]
    fn test_truthy_values() {
        assert!(Value::Smi(-1).is_truthy());
        assert!(Value::Double(f64::INFINITY).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::HeapObject(ObjectId(0)).is_truthy());
    }
}

#[cfg(test)]
mod value_type_tests {
    use super::*;

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::Boolean(true).type_of(), "boolean");
        assert_eq!(Value::Double(1.5).type_of(), "number");
        assert_eq!(Value::from("x").type_of(), "string");
        assert_eq!(Value::HeapObject(ObjectId(9)).type_of(), "object");
    }

    #[test]
    fn test_primitive_kinds_are_distinct() {
        let kinds = [
            Value::Boolean(true).primitive_kind(),
            Value::Smi(1).primitive_kind(),
            Value::from("s").primitive_kind(),
        ];
        assert_eq!(kinds[0], Some(PrimitiveKind::Boolean));
        assert_eq!(kinds[1], Some(PrimitiveKind::Number));
        assert_eq!(kinds[2], Some(PrimitiveKind::String));
        assert_ne!(kinds[0], kinds[1]);
    }

    #[test]
    fn test_to_number_for_length_writes() {
        assert_eq!(Value::Smi(3).to_number(), 3.0);
        assert_eq!(Value::from("5").to_number(), 5.0);
        assert!(Value::HeapObject(ObjectId(0)).to_number().is_nan());
    }
}
