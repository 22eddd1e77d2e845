use alloy::primitives::Bytes;
use alloy_dyn_abi::{
    DynSolType,
    DynSolValue,
    JsonAbiExt,
};
use alloy_json_abi::{
    Constructor,
    Param,
};

#[derive(thiserror::Error, Debug)]
pub enum EncodeArgsError {
    #[error("constructor expects {expected} argument(s), got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },
    #[error("invalid value {value:?} for constructor parameter `{param}`: {source}")]
    InvalidArgument {
        param: String,
        value: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },
    #[error("Dynamic ABI Error: {0}")]
    DynAbiError(#[from] alloy_dyn_abi::Error),
}

type Result<T> = std::result::Result<T, EncodeArgsError>;

/// ABI-encodes `args` against `constructor`. A missing constructor takes no
/// arguments and encodes to empty bytes.
pub fn encode_constructor_args<S: AsRef<str>>(
    constructor: Option<&Constructor>,
    args: &[S],
) -> Result<Bytes> {
    let Some(constructor) = constructor else {
        check_arity(0, args.len())?;
        return Ok(Bytes::new());
    };
    check_arity(constructor.inputs.len(), args.len())?;
    if args.is_empty() {
        return Ok(Bytes::new());
    }

    let values = encode_args(&constructor.inputs, args)?;
    let encoded = constructor.abi_encode_input(&values)?;
    Ok(Bytes::from(encoded))
}

/// Coerces each string argument to the type of the matching parameter.
pub fn encode_args<S: AsRef<str>>(inputs: &[Param], args: &[S]) -> Result<Vec<DynSolValue>> {
    check_arity(inputs.len(), args.len())?;
    std::iter::zip(inputs, args)
        .map(|(input, arg)| {
            coerce_value(&input.selector_type(), arg.as_ref()).map_err(|source| {
                EncodeArgsError::InvalidArgument {
                    param: param_label(input),
                    value: arg.as_ref().to_string(),
                    source,
                }
            })
        })
        .collect()
}

/// Helper function to coerce a value to a [DynSolValue] given a type string
pub fn coerce_value(ty: &str, arg: &str) -> std::result::Result<DynSolValue, alloy_dyn_abi::Error> {
    let ty = DynSolType::parse(ty)?;
    ty.coerce_str(arg)
}

fn check_arity(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(EncodeArgsError::ArgumentCountMismatch { expected, got })
    }
}

fn param_label(param: &Param) -> String {
    if param.name.is_empty() {
        param.ty.clone()
    } else {
        format!("{} {}", param.ty, param.name)
    }
}
