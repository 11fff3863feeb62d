//! Package version parsing and ordering.
//!
//! Registry version strings are mapped onto semver precedence:
//! - Release components compare numerically; `2.1` is padded to `2.1.0`
//! - `a`/`alpha`, `b`/`beta`, `rc`/`c` become pre-release identifiers
//! - `devN` on its own sorts before any alpha of the same release
//! - Release components past the third, and `postN`, become build metadata.
//!   Extra components are stored shifted by one and a post-release gets a
//!   leading `0`, so `1.2.3 < 1.2.3.post1 < 1.2.3.4 < 1.2.3.4.post1`
//! - Trailing zero components are dropped, so `1.27.0.0` equals `1.27.0`
//! - An epoch (`1!2.0`) is kept beside the semver value and compared first
//! - Local labels (`+cpu`) are dropped
//!
//! Strings mixing `dev` with a pre- or post-release tag are rejected.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,

    #[error("invalid version '{input}': {reason}")]
    Invalid { input: String, reason: String },
}

/// A parsed package version backed by semver, remembering the string it came from.
///
/// Equality and ordering use the parsed value only, so `1.0` equals `1.0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    original: String,
    epoch: u64,
    parsed: semver::Version,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }
        let (epoch, parsed) = to_semver(trimmed).map_err(|reason| VersionError::Invalid {
            input: input.to_string(),
            reason,
        })?;
        Ok(Self {
            original: trimmed.to_string(),
            epoch,
            parsed,
        })
    }

    /// The version exactly as the registry reported it; this is what gets pinned.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn as_semver(&self) -> &semver::Version {
        &self.parsed
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_prerelease(&self) -> bool {
        !self.parsed.pre.is_empty()
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch.hash(state);
        self.parsed.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.parsed.cmp(&other.parsed))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.original
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Alpha,
    Beta,
    Rc,
    Dev,
    Post,
}

fn to_semver(input: &str) -> Result<(u64, semver::Version), String> {
    let lowered = input.to_ascii_lowercase();
    let body = lowered.strip_prefix('v').unwrap_or(&lowered);
    let body = body.split('+').next().unwrap_or_default();
    let (epoch, body) = match body.split_once('!') {
        Some((epoch, rest)) => {
            let epoch = epoch
                .parse::<u64>()
                .map_err(|_| format!("bad epoch '{epoch}'"))?;
            (epoch, rest)
        }
        None => (0, body),
    };

    let release_end = body
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(body.len());
    let release = body[..release_end].trim_end_matches('.');
    let rest = &body[release_end..];

    if release.is_empty() {
        return Err("missing release number".to_string());
    }
    let mut numbers = Vec::new();
    for part in release.split('.') {
        let n = part
            .parse::<u64>()
            .map_err(|_| format!("bad release component '{part}'"))?;
        numbers.push(n);
    }
    while numbers.len() > 3 && numbers.last() == Some(&0) {
        numbers.pop();
    }

    let mut pre: Option<(Tag, u64)> = None;
    let mut dev: Option<u64> = None;
    let mut post: Option<u64> = None;

    let tokens = tokenize(rest);
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (tag, number) = if let Ok(n) = token.parse::<u64>() {
            // `1.0-1` is an implicit post-release
            if i == 0 {
                (Tag::Post, n)
            } else {
                return Err(format!("unexpected number '{token}'"));
            }
        } else {
            let tag = match token {
                "a" | "alpha" => Tag::Alpha,
                "b" | "beta" => Tag::Beta,
                "c" | "rc" | "pre" | "preview" => Tag::Rc,
                "dev" => Tag::Dev,
                "post" | "rev" | "r" => Tag::Post,
                other => return Err(format!("unknown qualifier '{other}'")),
            };
            let number = match tokens.get(i + 1).and_then(|t| t.parse::<u64>().ok()) {
                Some(n) => {
                    i += 1;
                    n
                }
                None => 0,
            };
            (tag, number)
        };

        let slot = match tag {
            Tag::Dev => &mut dev,
            Tag::Post => &mut post,
            _ => {
                if pre.is_some() {
                    return Err("more than one pre-release tag".to_string());
                }
                pre = Some((tag, number));
                i += 1;
                continue;
            }
        };
        if slot.is_some() {
            return Err(format!("repeated qualifier '{token}'"));
        }
        *slot = Some(number);
        i += 1;
    }

    if dev.is_some() && (pre.is_some() || post.is_some()) {
        return Err("dev combined with another qualifier".to_string());
    }

    let prerelease = match (pre, dev) {
        (Some((tag, n)), _) => {
            let name = match tag {
                Tag::Alpha => "alpha",
                Tag::Beta => "beta",
                _ => "rc",
            };
            format!("{name}.{n}")
        }
        // numeric identifiers sort below alphanumeric ones, so dev < alpha
        (None, Some(n)) => format!("0.dev.{n}"),
        (None, None) => String::new(),
    };

    let mut build = Vec::new();
    for n in numbers.iter().skip(3) {
        let shifted = n
            .checked_add(1)
            .ok_or_else(|| format!("release component '{n}' is too large"))?;
        build.push(shifted.to_string());
    }
    if let Some(n) = post {
        build.push("0".to_string());
        build.push(n.to_string());
    }

    let mut version = semver::Version::new(
        numbers[0],
        numbers.get(1).copied().unwrap_or(0),
        numbers.get(2).copied().unwrap_or(0),
    );
    if !prerelease.is_empty() {
        version.pre = Prerelease::new(&prerelease).map_err(|e| e.to_string())?;
    }
    if !build.is_empty() {
        version.build = BuildMetadata::new(&build.join(".")).map_err(|e| e.to_string())?;
    }
    Ok((epoch, version))
}

/// Split a qualifier tail like `.post1` or `rc2` into `["post", "1"]`, `["rc", "2"]`.
fn tokenize(rest: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in rest.chars() {
        if matches!(ch, '.' | '-' | '_') {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        let boundary = current
            .chars()
            .last()
            .is_some_and(|last| last.is_ascii_digit() != ch.is_ascii_digit());
        if boundary {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
