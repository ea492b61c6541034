use url::Url;

/// Well-known link relations.
pub mod rel {
    pub const AUTHENTICATION_DOCUMENT: &str = "http://opds-spec.org/auth/document";
    pub const CATALOG: &str = "http://opds-spec.org/catalog";
    pub const THUMBNAIL: &str = "http://opds-spec.org/image/thumbnail";
    pub const START: &str = "start";
    pub const LOGO: &str = "logo";
    pub const TERMS_OF_SERVICE: &str = "terms-of-service";
    pub const LICENSE: &str = "license";
    pub const PRIVACY_POLICY: &str = "privacy-policy";
    pub const HELP: &str = "help";
    pub const REGISTER: &str = "register";
    pub const SHELF: &str = "http://opds-spec.org/shelf";
    pub const USER_PROFILE: &str = "http://librarysimplified.org/terms/rel/user-profile";
}

#[derive(Debug, thiserror::Error)]
#[error("invalid link href {href:?}: {source}")]
pub struct LinkError {
    pub href: String,
    #[source]
    pub source: url::ParseError,
}

/// A typed link. Templated links (RFC 6570) cannot be fetched directly.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawLink", into = "RawLink")]
pub enum Link {
    Basic {
        href: Url,
        rel: Option<String>,
        mime_type: Option<String>,
        title: Option<String>,
    },
    Templated {
        href: String,
        rel: Option<String>,
        mime_type: Option<String>,
        title: Option<String>,
    },
}

impl Link {
    pub fn basic(href: Url, rel: impl Into<String>) -> Self {
        Link::Basic {
            href,
            rel: Some(rel.into()),
            mime_type: None,
            title: None,
        }
    }

    pub fn rel(&self) -> Option<&str> {
        match self {
            Link::Basic { rel, .. } | Link::Templated { rel, .. } => rel.as_deref(),
        }
    }

    pub fn has_rel(&self, wanted: &str) -> bool {
        self.rel() == Some(wanted)
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Link::Basic { mime_type, .. } | Link::Templated { mime_type, .. } => {
                mime_type.as_deref()
            }
        }
    }

    pub fn href_str(&self) -> &str {
        match self {
            Link::Basic { href, .. } => href.as_str(),
            Link::Templated { href, .. } => href,
        }
    }

    /// The fetchable target, or `None` for templated links.
    pub fn href(&self) -> Option<&Url> {
        match self {
            Link::Basic { href, .. } => Some(href),
            Link::Templated { .. } => None,
        }
    }

    pub fn is_templated(&self) -> bool {
        matches!(self, Link::Templated { .. })
    }
}

/// Finds the fetchable target of the first link carrying `rel`.
pub fn find_href<'a>(links: &'a [Link], rel: &str) -> Option<&'a Url> {
    links.iter().find(|l| l.has_rel(rel)).and_then(Link::href)
}

#[derive(serde::Serialize, serde::Deserialize)]
struct RawLink {
    href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rel: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    templated: bool,
}

impl TryFrom<RawLink> for Link {
    type Error = LinkError;

    fn try_from(raw: RawLink) -> Result<Self, Self::Error> {
        if raw.templated {
            return Ok(Link::Templated {
                href: raw.href,
                rel: raw.rel,
                mime_type: raw.mime_type,
                title: raw.title,
            });
        }
        let href = Url::parse(&raw.href).map_err(|source| LinkError {
            href: raw.href.clone(),
            source,
        })?;
        Ok(Link::Basic {
            href,
            rel: raw.rel,
            mime_type: raw.mime_type,
            title: raw.title,
        })
    }
}

impl From<Link> for RawLink {
    fn from(link: Link) -> Self {
        match link {
            Link::Basic {
                href,
                rel,
                mime_type,
                title,
            } => RawLink {
                href: href.into(),
                rel,
                mime_type,
                title,
                templated: false,
            },
            Link::Templated {
                href,
                rel,
                mime_type,
                title,
            } => RawLink {
                href,
                rel,
                mime_type,
                title,
                templated: true,
            },
        }
    }
}
