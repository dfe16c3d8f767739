//! Minimal `.netrc` reader: `machine`/`default` entries with `login` and `password`.

use std::fs;
use std::path::{Path, PathBuf};

/// One `machine` (or `default`) block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetrcEntry {
    pub login: Option<String>,
    pub account: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Netrc {
    machines: Vec<(String, NetrcEntry)>,
    default: Option<NetrcEntry>,
}

impl Netrc {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(Self::parse(&data))
    }

    /// Parse netrc text. Unknown tokens are skipped; `macdef` bodies run to the
    /// next blank line.
    pub fn parse(data: &str) -> Self {
        let mut netrc = Netrc::default();
        let mut current: Option<(Option<String>, NetrcEntry)> = None;
        let mut lines = data.lines();

        while let Some(line) = lines.next() {
            let mut tokens = line.split_whitespace();
            while let Some(token) = tokens.next() {
                match token {
                    "machine" => {
                        netrc.push(current.take());
                        let host = tokens.next().unwrap_or_default().to_string();
                        current = Some((Some(host), NetrcEntry::default()));
                    }
                    "default" => {
                        netrc.push(current.take());
                        current = Some((None, NetrcEntry::default()));
                    }
                    "login" | "account" | "password" => {
                        let value = tokens.next().map(str::to_string);
                        if let Some((_, entry)) = current.as_mut() {
                            match token {
                                "login" => entry.login = value,
                                "account" => entry.account = value,
                                _ => entry.password = value,
                            }
                        }
                    }
                    "macdef" => {
                        for body in lines.by_ref() {
                            if body.trim().is_empty() {
                                break;
                            }
                        }
                        break;
                    }
                    t if t.starts_with('#') => break,
                    _ => {}
                }
            }
        }
        netrc.push(current);
        netrc
    }

    fn push(&mut self, block: Option<(Option<String>, NetrcEntry)>) {
        match block {
            Some((Some(host), entry)) => self.machines.push((host, entry)),
            Some((None, entry)) => self.default = Some(entry),
            None => {}
        }
    }

    /// Entry for `host`, falling back to the `default` block.
    pub fn authenticators(&self, host: &str) -> Option<&NetrcEntry> {
        self.machines
            .iter()
            .find(|(machine, _)| machine.eq_ignore_ascii_case(host))
            .map(|(_, entry)| entry)
            .or(self.default.as_ref())
    }
}

/// `$HOME/.netrc`, when a home directory is known.
pub fn default_netrc_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".netrc"))
}
