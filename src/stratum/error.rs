use super::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InternalError {
    #[snafu(display("invalid hex integer '{input}'"))]
    ParseHexInt {
        input: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("{reason}"))]
    InvalidValue { reason: String },
}
