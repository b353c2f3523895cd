#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use landwarp_landmarks as landmarks;

#[doc(inline)]
pub use landwarp_tps as tps;

/// Host-facing warper factory: fit, describe and apply.
pub mod factory;

pub use factory::{
    fit, fit_with_prescale, make_warper, TpsWarperFactory, ValidationCheck, ValidationState,
    WarperFactoryError,
};
