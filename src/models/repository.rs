use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ModelError;

/// A repository reference
///
/// Equality and hashing are by `(owner, name)` only, so references parsed from
/// card links, event sources, closes lines and the configuration all join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Repository {
    /// User or organization owning the repository
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Extracts the repository from the URL of a resource inside it
    ///
    /// The owner and name are the two path segments preceding the resource
    /// kind and id, which covers both API and browser URLs:
    ///
    /// ```
    /// use ghsprint::models::Repository;
    ///
    /// let api = Repository::from_resource_url("https://api.github.com/repos/acme/widgets/issues/42").unwrap();
    /// let web = Repository::from_resource_url("https://github.com/acme/widgets/issues/42").unwrap();
    /// assert_eq!(api, web);
    /// assert_eq!(api.to_string(), "acme/widgets");
    /// ```
    pub fn from_resource_url(url: &str) -> Result<Self, ModelError> {
        let segments = path_segments(url)?;
        if segments.len() < 4 {
            return Err(ModelError::InvalidUrl(url.to_string()));
        }
        let owner = &segments[segments.len() - 4];
        let name = &segments[segments.len() - 3];
        Ok(Self::new(owner.as_str(), name.as_str()))
    }

    /// Extracts the repository from a repository URL such as
    /// `https://api.github.com/repos/acme/widgets`
    pub fn from_repository_url(url: &str) -> Result<Self, ModelError> {
        let segments = path_segments(url)?;
        if segments.len() < 2 {
            return Err(ModelError::InvalidUrl(url.to_string()));
        }
        let owner = &segments[segments.len() - 2];
        let name = &segments[segments.len() - 1];
        Ok(Self::new(owner.as_str(), name.as_str()))
    }
}

fn path_segments(url: &str) -> Result<Vec<String>, ModelError> {
    if !url.starts_with("http") {
        return Err(ModelError::InvalidUrl(url.to_string()));
    }
    let parsed = Url::parse(url).map_err(|_| ModelError::InvalidUrl(url.to_string()))?;
    let segments = parsed
        .path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(segments)
}

impl FromStr for Repository {
    type Err = String;

    /// Parses the `owner/name` form used on the command line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(format!("`{}` is not an `owner/name` repository", s)),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
