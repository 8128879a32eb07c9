//! `TVec`: the host surface of [`FltVec`]

use super::FltVec;
use crate::error::{BindError, Result};
use crate::extract::{Args, FromHostValue, Param, Signature};
use crate::value::{HostValue, ValueType};
use crate::wrap::{AccessorDef, MethodBody, MethodDef, NativeClass};

const INDEX: Param = Param::required("index", ValueType::Int32);
const VALUE: Param = Param::required("value", ValueType::Number);

impl NativeClass for FltVec {
    const CLASS_NAME: &'static str = "TVec";

    /// `new TVec()`, `new TVec([1, 2])` or `new TVec({ vals: [1, 2], capacity: 16 })`
    const CONSTRUCTOR: Signature = &[Param::optional("init", ValueType::Json)];

    const METHODS: &'static [MethodDef<Self>] = &[
        MethodDef {
            name: "at",
            params: &[INDEX],
            body: MethodBody::Query(at),
        },
        MethodDef {
            name: "put",
            params: &[INDEX, VALUE],
            body: MethodBody::Mutate(put),
        },
        MethodDef {
            name: "push",
            params: &[VALUE],
            body: MethodBody::Mutate(push),
        },
        MethodDef {
            name: "sum",
            params: &[],
            body: MethodBody::Query(sum),
        },
        MethodDef {
            name: "getMaxIdx",
            params: &[],
            body: MethodBody::Query(get_max_idx),
        },
        MethodDef {
            name: "sort",
            params: &[Param::optional("asc", ValueType::Bool)],
            body: MethodBody::Derive(sort),
        },
        MethodDef {
            name: "shuffle",
            params: &[],
            body: MethodBody::Unsupported,
        },
        MethodDef {
            name: "trunc",
            params: &[Param::required("length", ValueType::Int32)],
            body: MethodBody::Unsupported,
        },
        MethodDef {
            name: "subscribe",
            params: &[Param::required("callback", ValueType::Function)],
            body: MethodBody::Listen,
        },
    ];

    const ACCESSORS: &'static [AccessorDef<Self>] = &[AccessorDef {
        name: "length",
        get: length,
    }];

    fn construct(args: &Args<'_, Self>) -> Result<Self> {
        let Some(init) = args.call().arg(0) else {
            return Ok(FltVec::new());
        };
        if let HostValue::Array(items) = init {
            return numbers(items, 0).map(FltVec::from);
        }
        // Negative capacities are treated as no hint
        let capacity: i32 = args.require_property(0, "capacity", 0)?;
        let capacity = usize::try_from(capacity).unwrap_or(0).min(MAX_CAPACITY_HINT);
        let mut vec = FltVec::with_capacity(capacity);
        match init.property("vals") {
            None => {}
            Some(HostValue::Array(items)) => vec.extend_from_slice(&numbers(items, 0)?),
            Some(other) => {
                return Err(BindError::property_mismatch(0, "vals", ValueType::Array, other));
            }
        }
        Ok(vec)
    }
}

/// Upper bound on the preallocation a `capacity` option may request
const MAX_CAPACITY_HINT: usize = 1 << 16;

fn numbers(items: &[HostValue], position: usize) -> Result<Vec<f64>> {
    items
        .iter()
        .map(|item| {
            f64::from_host(item)
                .ok_or_else(|| BindError::type_mismatch(position, ValueType::Number, item))
        })
        .collect()
}

fn at(vec: &FltVec, args: &Args<'_, FltVec>) -> Result<HostValue> {
    let index: i32 = args.require(0)?;
    vec.at(i64::from(index)).map(HostValue::Number)
}

fn put(vec: &mut FltVec, args: &Args<'_, FltVec>) -> Result<HostValue> {
    let index: i32 = args.require(0)?;
    let value: f64 = args.require(1)?;
    vec.put(i64::from(index), value)?;
    Ok(HostValue::Bool(true))
}

/// Returns the new length
fn push(vec: &mut FltVec, args: &Args<'_, FltVec>) -> Result<HostValue> {
    let value: f64 = args.require(0)?;
    let len = vec.push(value);
    Ok(HostValue::Number(len as f64))
}

fn sum(vec: &FltVec, _args: &Args<'_, FltVec>) -> Result<HostValue> {
    Ok(HostValue::Number(vec.sum()))
}

fn get_max_idx(vec: &FltVec, _args: &Args<'_, FltVec>) -> Result<HostValue> {
    vec.max_idx().map(|i| HostValue::Number(i as f64))
}

fn sort(vec: &FltVec, args: &Args<'_, FltVec>) -> Result<FltVec> {
    let ascending = args.require_or(0, true)?;
    Ok(vec.sorted(ascending))
}

fn length(vec: &FltVec) -> HostValue {
    HostValue::Number(vec.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::CallRecord;
    use crate::json::SerdeJson;

    fn build(args: Vec<HostValue>) -> Result<FltVec> {
        let call = CallRecord::construct("TVec", args);
        FltVec::construct(&Args::new(&call, &SerdeJson))
    }

    fn query(vec: &FltVec, name: &str, args: Vec<HostValue>) -> Result<HostValue> {
        let call = CallRecord::plain(name, args);
        let args = Args::new(&call, &SerdeJson);
        match FltVec::method(name).map(|m| &m.body) {
            Some(MethodBody::Query(f)) => f(vec, &args),
            _ => panic!("{name} is not a query"),
        }
    }

    #[test]
    fn test_construct_empty() {
        assert!(build(vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_construct_from_array() {
        let vec = build(vec![HostValue::numbers([3.0, 1.0, 2.0])]).unwrap();
        assert_eq!(vec.values(), &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_construct_from_options() {
        let init = HostValue::object([
            ("vals", HostValue::numbers([1.5, 2.5])),
            ("capacity", HostValue::Number(16.0)),
        ]);
        let vec = build(vec![init]).unwrap();
        assert_eq!(vec.values(), &[1.5, 2.5]);
    }

    #[test]
    fn test_construct_options_without_vals() {
        let init = HostValue::object([("capacity", HostValue::Number(4.0))]);
        assert!(build(vec![init]).unwrap().is_empty());
        let init = HostValue::object([("unrelated", HostValue::Bool(true))]);
        assert!(build(vec![init]).unwrap().is_empty());
    }

    #[test]
    fn test_construct_rejects_non_numbers() {
        let init = HostValue::Array(vec![HostValue::Number(1.0), HostValue::Str("two".into())]);
        let err = build(vec![init]).unwrap_err();
        assert_eq!(
            err,
            BindError::ArgumentTypeMismatch {
                position: 0,
                expected: ValueType::Number,
                got: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_construct_keeps_non_finite_and_signed_zero() {
        let vec = build(vec![HostValue::numbers([1.0, f64::INFINITY, -0.0])]).unwrap();
        assert_eq!(vec.values()[1], f64::INFINITY);
        assert!(vec.values()[2].is_sign_negative());

        let init = HostValue::object([("vals", HostValue::numbers([f64::NEG_INFINITY, f64::NAN]))]);
        let vec = build(vec![init]).unwrap();
        assert_eq!(vec.values()[0], f64::NEG_INFINITY);
        assert!(vec.values()[1].is_nan());
    }

    #[test]
    fn test_construct_clamps_capacity_hint() {
        let init = HostValue::object([("capacity", HostValue::Number(f64::from(i32::MAX)))]);
        let vec = build(vec![init]).unwrap();
        assert!(vec.is_empty());
    }

    #[test]
    fn test_construct_rejects_non_array_vals() {
        let init = HostValue::object([("vals", HostValue::Str("1,2".into()))]);
        assert_eq!(
            build(vec![init]).unwrap_err(),
            BindError::PropertyTypeMismatch {
                position: 0,
                property: "vals".to_string(),
                expected: ValueType::Array,
                got: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_construct_rejects_bad_capacity_type() {
        let init = HostValue::object([("capacity", HostValue::Str("big".into()))]);
        assert_eq!(build(vec![init]).unwrap_err().kind(), "PropertyTypeMismatch");
    }

    #[test]
    fn test_at_and_sum() {
        let vec = FltVec::from(vec![1.5, 2.5, 3.0]);
        assert_eq!(query(&vec, "at", vec![HostValue::Number(1.0)]), Ok(HostValue::Number(2.5)));
        assert_eq!(query(&vec, "sum", vec![]), Ok(HostValue::Number(7.0)));
        assert_eq!(
            query(&vec, "at", vec![HostValue::Number(3.0)]).unwrap_err().kind(),
            "IndexOutOfBounds"
        );
    }

    #[test]
    fn test_get_max_idx() {
        let vec = FltVec::from(vec![3.0, 5.0, 5.0, 1.0]);
        assert_eq!(query(&vec, "getMaxIdx", vec![]), Ok(HostValue::Number(1.0)));
        assert_eq!(
            query(&FltVec::new(), "getMaxIdx", vec![]).unwrap_err().kind(),
            "EmptyVectorOperation"
        );
    }

    #[test]
    fn test_push_returns_length() {
        let mut vec = FltVec::from(vec![1.0]);
        let call = CallRecord::plain("push", vec![HostValue::Number(2.0)]);
        let args = Args::new(&call, &SerdeJson);
        assert_eq!(push(&mut vec, &args), Ok(HostValue::Number(2.0)));
    }

    #[test]
    fn test_sort_defaults_to_ascending() {
        let vec = FltVec::from(vec![3.0, 1.0, 2.0]);
        let call = CallRecord::plain("sort", vec![]);
        let sorted = sort(&vec, &Args::new(&call, &SerdeJson)).unwrap();
        assert_eq!(sorted.values(), &[1.0, 2.0, 3.0]);

        let call = CallRecord::plain("sort", vec![HostValue::Bool(false)]);
        let sorted = sort(&vec, &Args::new(&call, &SerdeJson)).unwrap();
        assert_eq!(sorted.values(), &[3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_length_accessor() {
        let get = FltVec::accessor("length").unwrap().get;
        assert_eq!(get(&FltVec::from(vec![0.0; 3])), HostValue::Number(3.0));
    }
}
