//! Query builder
//!
//! Translates a search argument plus extra options into a resource path.
//!
//! ```rust,ignore
//! let path = build_path(&computer, &"serial_number=C02X1234".into(), &QueryOptions::new())?;
//! assert_eq!(path, "JSSResource/computers/serialnumber/C02X1234");
//! ```

mod builder;
mod types;

pub use builder::{
    accepts, build_path, encode_segment, is_valid_id, option_segments, post_path, resource_path,
    WILDCARD,
};
pub use types::{is_integer_like, OptionValue, QueryOptions, SearchArg, DATE_RANGE, SUBSET};
