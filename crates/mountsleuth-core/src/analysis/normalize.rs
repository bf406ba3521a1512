/// Host-path canonicalization — turns raw mount source strings into
/// comparable `CanonicalKey`s.
///
/// The same physical directory shows up under wildly different spellings
/// depending on where the compose file was written: `C:\docker\data`,
/// `/mnt/c/docker/data`, `/volume1/data`, `/mnt/user/data/`. Canonical keys
/// make those comparable so the conflict rules can reason about equality and
/// subtree containment instead of string shapes.
///
/// Normalization is total for non-empty input: anything unrecognized falls
/// back to an opaque literal key rather than failing. Empty or
/// whitespace-only paths are invalid mount data and are rejected upstream.
use crate::analysis::platform::Platform;
use crate::error::MountDataError;
use compact_str::CompactString;
use std::fmt;

/// The storage root a canonical key is anchored to.
///
/// Distinct root kinds imply distinct physical filesystems — the heart of
/// the cross-backend and split-root rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathRoot {
    /// Windows drive letter (stored lowercased), from `C:\...` or the WSL2
    /// `/mnt/c/...` convention on mixed hosts.
    Drive(char),
    /// NAS-style volume root, e.g. `volume1` on Synology.
    Volume(CompactString),
    /// Plain POSIX bind-mount path.
    Bind,
    /// Unparseable but non-empty input kept as a case-preserved literal
    /// (UNC shares, relative paths).
    Opaque(CompactString),
}

impl PathRoot {
    /// Coarse backend category used by the cross-filesystem rule.
    pub fn backend_label(&self) -> &'static str {
        match self {
            Self::Drive(_) => "windows-drive",
            Self::Volume(_) => "nas-volume",
            Self::Bind => "bind-mount",
            Self::Opaque(_) => "unrecognized",
        }
    }
}

/// Canonical, comparable representation of a host path.
///
/// Equality means "same location on the same physical filesystem root";
/// [`CanonicalKey::is_ancestor_of`] gives the subtree partial order.
/// The `Display` rendering is a fixed point of normalization: feeding it
/// back through [`PathNormalizer::normalize`] yields an equal key under
/// every platform hint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalKey {
    root: PathRoot,
    segments: Vec<CompactString>,
}

impl CanonicalKey {
    pub fn root(&self) -> &PathRoot {
        &self.root
    }

    pub fn segments(&self) -> &[CompactString] {
        &self.segments
    }

    /// Strict ancestor: `self` denotes a directory that contains `other`'s
    /// location as a proper subtree.
    pub fn is_ancestor_of(&self, other: &CanonicalKey) -> bool {
        self.root == other.root
            && self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Equal, ancestor, or descendant — the cooperation relation on keys.
    pub fn is_related(&self, other: &CanonicalKey) -> bool {
        self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    /// Rendering to suggest to users: drive keys print in the WSL2 mount
    /// form on Windows-family hosts, since that is the spelling compose
    /// files there should use.
    pub fn preferred_display(&self, platform: Platform) -> String {
        if platform.is_windows_family() {
            if let PathRoot::Drive(d) = self.root {
                let mut out = format!("/mnt/{d}");
                for seg in &self.segments {
                    out.push('/');
                    out.push_str(seg);
                }
                return out;
            }
        }
        self.to_string()
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            PathRoot::Drive(d) => {
                write!(f, "{}:", d.to_ascii_uppercase())?;
                if self.segments.is_empty() {
                    return write!(f, "/");
                }
            }
            PathRoot::Volume(v) => {
                write!(f, "/{v}")?;
            }
            PathRoot::Bind => {
                if self.segments.is_empty() {
                    return write!(f, "/");
                }
            }
            PathRoot::Opaque(s) => return write!(f, "{s}"),
        }
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

/// The shared top-level root of a set of keys, rendered canonically, or
/// `None` when no single root covers them all.
///
/// Drive and volume roots are filesystem roots in their own right; for
/// plain bind paths the first path segment is taken as the root (a shape
/// heuristic — the engine never inspects real devices).
pub fn common_root(keys: &[CanonicalKey]) -> Option<String> {
    let first = keys.first()?;
    if keys.iter().any(|k| k.root != first.root) {
        return None;
    }
    match &first.root {
        PathRoot::Drive(_) | PathRoot::Volume(_) | PathRoot::Opaque(_) => Some(
            CanonicalKey {
                root: first.root.clone(),
                segments: Vec::new(),
            }
            .to_string(),
        ),
        PathRoot::Bind => {
            // A "/" mount covers every bind path.
            if keys.iter().any(|k| k.segments.is_empty()) {
                return Some("/".to_owned());
            }
            let head = &keys[0].segments[0];
            if keys.iter().all(|k| &k.segments[0] == head) {
                Some(format!("/{head}"))
            } else {
                None
            }
        }
    }
}

/// Canonicalizes raw host paths under a fixed platform hint.
#[derive(Debug, Clone, Copy)]
pub struct PathNormalizer {
    platform: Platform,
}

impl PathNormalizer {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Canonicalize one raw host path.
    ///
    /// Never fails for malformed-but-non-empty input — unrecognized shapes
    /// become opaque literal keys. Only empty/whitespace paths error.
    pub fn normalize(&self, raw: &str) -> Result<CanonicalKey, MountDataError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MountDataError::EmptyHostPath);
        }

        // UNC shares (\\server\share, \\wsl$\...) carry no drive letter to
        // map; keep them literal.
        if trimmed.starts_with("\\\\") {
            return Ok(opaque(trimmed));
        }

        if let Some((drive, rest)) = split_drive(trimmed) {
            return Ok(CanonicalKey {
                root: PathRoot::Drive(drive),
                segments: windows_segments(rest),
            });
        }

        if trimmed.starts_with('/') {
            let segments = posix_segments(trimmed);

            // WSL2 drive convention: /mnt/<letter>/... denotes the Windows
            // drive when the host is a mixed Windows/WSL2 setup. On plain
            // Linux hosts /mnt/c is just a directory.
            if self.platform.is_windows_family() && segments.len() >= 2 && segments[0] == "mnt" {
                if let Some(drive) = single_ascii_letter(&segments[1]) {
                    return Ok(CanonicalKey {
                        root: PathRoot::Drive(drive),
                        segments: segments[2..]
                            .iter()
                            .map(|s| CompactString::from(s.to_lowercase()))
                            .collect(),
                    });
                }
            }

            if let Some(first) = segments.first() {
                if is_volume_root(first) {
                    return Ok(CanonicalKey {
                        root: PathRoot::Volume(first.clone()),
                        segments: segments[1..].to_vec(),
                    });
                }
            }

            return Ok(CanonicalKey {
                root: PathRoot::Bind,
                segments,
            });
        }

        // Relative paths, lone backslash forms, anything else: literal.
        Ok(opaque(trimmed))
    }
}

fn opaque(literal: &str) -> CanonicalKey {
    CanonicalKey {
        root: PathRoot::Opaque(CompactString::from(literal)),
        segments: Vec::new(),
    }
}

/// Split a Windows drive-letter prefix (`C:`, `c:/x`, `C:\x`) off a path.
fn split_drive(path: &str) -> Option<(char, &str)> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let rest = &path[2..];
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
            return Some((bytes[0].to_ascii_lowercase() as char, rest));
        }
    }
    None
}

/// Segment a Windows path remainder. Both separators are accepted and the
/// comparison is case-insensitive, so segments are lowercased.
fn windows_segments(rest: &str) -> Vec<CompactString> {
    let mut segments = Vec::new();
    for part in rest.split(['/', '\\']) {
        push_segment(&mut segments, part, true);
    }
    segments
}

/// Segment a POSIX path: trailing-slash-insensitive, case-preserving,
/// `.`/`..` resolved best-effort.
fn posix_segments(path: &str) -> Vec<CompactString> {
    let mut segments = Vec::new();
    for part in path.split('/') {
        push_segment(&mut segments, part, false);
    }
    segments
}

fn push_segment(segments: &mut Vec<CompactString>, part: &str, fold_case: bool) {
    match part {
        "" | "." => {}
        ".." => {
            segments.pop();
        }
        _ => {
            if fold_case {
                segments.push(CompactString::from(part.to_lowercase()));
            } else {
                segments.push(CompactString::from(part));
            }
        }
    }
}

/// Single ASCII letter, lowercased — a drive-letter segment.
fn single_ascii_letter(segment: &str) -> Option<char> {
    let mut chars = segment.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// NAS-style volume root: `volume1`, `volume2`, ...
fn is_volume_root(segment: &str) -> bool {
    segment
        .strip_prefix("volume")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
