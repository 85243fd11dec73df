//! The [`Action`] trait.

use crate::descriptor::Bindable;
use crate::error::BindError;
use crate::response::Reply;
use std::future::Future;

/// A bindable request handler.
///
/// For every request a fresh instance is created with `Default`, populated
/// from the request, passed through [`Action::init`], and finally run with
/// [`Action::go`]. Afterwards the instance is published on the context
/// (see [`BindContext::action`](crate::BindContext::action)), which is why
/// actions are `Sync`.
///
/// # Example
///
/// ```rust,ignore
/// use fieldwire::prelude::*;
///
/// #[derive(Default, Bindable)]
/// struct Hello {
///     #[bind(param = "Query", default = "world")]
///     name: String,
/// }
///
/// impl Action for Hello {
///     async fn go(&mut self) -> Result<Reply, BindError> {
///         Ok(Reply::json(format!("hello {}", self.name)))
///     }
/// }
/// ```
pub trait Action: Bindable + Sync {
    /// Runs after all fields are bound and validated, before [`Action::go`].
    ///
    /// An error aborts the request.
    fn init(&mut self) -> Result<(), BindError> {
        Ok(())
    }

    /// Business method.
    fn go(&mut self) -> impl Future<Output = Result<Reply, BindError>> + Send;
}
