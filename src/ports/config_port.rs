//! Configuration access port trait.

use crate::domain::error::RebalancerError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent; an error when it is not a number.
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, RebalancerError>;
}
