mod authentication;
mod description;
mod link;
mod provider;

pub use authentication::{AccountProviderAuthentication, BasicAuthentication, KeyboardInput};
pub use description::AccountProviderDescription;
pub use link::{find_href, rel, Link, LinkError};
pub use provider::AccountProvider;

use chrono::{DateTime, Utc};
use url::Url;

/// Records that compete under the "latest `updated` wins" policy.
pub trait Timestamped {
    fn id(&self) -> &Url;
    fn updated(&self) -> DateTime<Utc>;
}
