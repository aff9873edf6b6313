//! Pull-based announcement scanning
//!
//! Callers page through announcements with `(from_cursor, limit)` and get
//! back `(matches, next_cursor)`. Nothing is pushed and nothing is held
//! open between calls, so a scan can stop and resume at any cursor. Large
//! batches can be sharded across a rayon pool; shards are independent and
//! results are reconciled into cursor order.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::curve::{Curve, PublicKey, SecretScalar};
use crate::error::{Error, Result};
use crate::stealth::{scan, StealthAddress, StealthKeys};

/// A published payment as seen by a scanner, before validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub cursor: u64,
    pub curve: Curve,
    pub stealth_address: Vec<u8>,
    pub ephemeral_public_key: Vec<u8>,
    pub view_tag: u8,
}

impl Announcement {
    pub fn new(cursor: u64, address: &StealthAddress) -> Self {
        Self {
            cursor,
            curve: address.address.curve(),
            stealth_address: address.address.as_bytes().to_vec(),
            ephemeral_public_key: address.ephemeral_public_key.as_bytes().to_vec(),
            view_tag: address.view_tag,
        }
    }

    /// Validate both points
    pub fn parse(&self) -> Result<StealthAddress> {
        Ok(StealthAddress {
            address: PublicKey::parse(self.curve, &self.stealth_address)?,
            ephemeral_public_key: PublicKey::parse(self.curve, &self.ephemeral_public_key)?,
            view_tag: self.view_tag,
        })
    }
}

/// Anything that can serve announcements in ascending cursor order
pub trait AnnouncementSource {
    /// Up to `limit` announcements with `cursor >= from_cursor`
    fn fetch(&self, from_cursor: u64, limit: usize) -> Result<Vec<Announcement>>;
}

impl AnnouncementSource for [Announcement] {
    fn fetch(&self, from_cursor: u64, limit: usize) -> Result<Vec<Announcement>> {
        Ok(self
            .iter()
            .filter(|a| a.cursor >= from_cursor)
            .take(limit)
            .cloned()
            .collect())
    }
}

impl AnnouncementSource for Vec<Announcement> {
    fn fetch(&self, from_cursor: u64, limit: usize) -> Result<Vec<Announcement>> {
        self.as_slice().fetch(from_cursor, limit)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanMatch {
    pub cursor: u64,
    pub stealth_address: StealthAddress,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub matches: Vec<ScanMatch>,
    /// Resume point for the next call
    pub next_cursor: u64,
    pub scanned: usize,
    /// Announcements with malformed keys
    pub skipped: usize,
}

/// Scans with a viewing secret and the spending public key
///
/// Holds no spending secret, so it can run on a less trusted machine.
pub struct Scanner {
    spending_public_key: PublicKey,
    viewing_secret: SecretScalar,
}

impl Scanner {
    pub fn new(keys: &StealthKeys) -> Self {
        Self {
            spending_public_key: keys.meta_address().spending_public_key,
            viewing_secret: keys.viewing_secret().duplicate(),
        }
    }

    pub fn view_only(spending_public_key: PublicKey, viewing_secret: SecretScalar) -> Result<Self> {
        if spending_public_key.curve() != viewing_secret.curve() {
            return Err(Error::CurveMismatch {
                expected: viewing_secret.curve(),
                actual: spending_public_key.curve(),
            });
        }
        Ok(Self {
            spending_public_key,
            viewing_secret,
        })
    }

    /// Scan one batch; returns matches and the number of skipped entries
    pub fn scan_batch(&self, batch: &[Announcement]) -> (Vec<ScanMatch>, usize) {
        let mut matches = Vec::new();
        let mut skipped = 0;
        for announcement in batch {
            match announcement.parse() {
                Ok(candidate) => {
                    if scan(&candidate, &self.spending_public_key, &self.viewing_secret).is_mine() {
                        matches.push(ScanMatch {
                            cursor: announcement.cursor,
                            stealth_address: candidate,
                        });
                    }
                }
                Err(e) => {
                    trace!(cursor = announcement.cursor, error = %e, "skipping malformed announcement");
                    skipped += 1;
                }
            }
        }
        (matches, skipped)
    }

    /// Fetch and scan one page
    pub fn scan_page<S>(&self, source: &S, from_cursor: u64, limit: usize) -> Result<ScanPage>
    where
        S: AnnouncementSource + ?Sized,
    {
        let batch = source.fetch(from_cursor, limit)?;
        let next_cursor = batch
            .last()
            .map(|a| a.cursor.saturating_add(1))
            .unwrap_or(from_cursor);
        let (matches, skipped) = self.scan_batch(&batch);

        debug!(
            from_cursor,
            next_cursor,
            scanned = batch.len(),
            matched = matches.len(),
            skipped,
            "scanned announcement page"
        );

        Ok(ScanPage {
            matches,
            next_cursor,
            scanned: batch.len(),
            skipped,
        })
    }

    /// Lazy sequence of pages starting at `from_cursor`; ends on an empty page
    pub fn pages<'a, S>(&'a self, source: &'a S, from_cursor: u64, limit: usize) -> ScanPages<'a, S>
    where
        S: AnnouncementSource + ?Sized,
    {
        ScanPages {
            scanner: self,
            source,
            cursor: from_cursor,
            limit,
            done: false,
        }
    }

    /// Shard `batch` across the rayon pool and reconcile in cursor order
    pub fn scan_parallel(&self, batch: &[Announcement], shards: usize) -> ScanPage {
        let shards = shards.max(1);
        let chunk = ((batch.len() + shards - 1) / shards).max(1);

        let results: Vec<(Vec<ScanMatch>, usize)> = batch
            .par_chunks(chunk)
            .map(|shard| self.scan_batch(shard))
            .collect();

        let mut matches = Vec::new();
        let mut skipped = 0;
        for (shard_matches, shard_skipped) in results {
            matches.extend(shard_matches);
            skipped += shard_skipped;
        }
        matches.sort_by_key(|m| m.cursor);

        let next_cursor = batch
            .iter()
            .map(|a| a.cursor.saturating_add(1))
            .max()
            .unwrap_or(0);

        debug!(
            shards,
            scanned = batch.len(),
            matched = matches.len(),
            skipped,
            "parallel scan complete"
        );

        ScanPage {
            matches,
            next_cursor,
            scanned: batch.len(),
            skipped,
        }
    }
}

/// Iterator returned by [`Scanner::pages`]
pub struct ScanPages<'a, S: ?Sized> {
    scanner: &'a Scanner,
    source: &'a S,
    cursor: u64,
    limit: usize,
    done: bool,
}

impl<'a, S> ScanPages<'a, S>
where
    S: ?Sized,
{
    /// Cursor the next page will start from
    pub fn cursor(&self) -> u64 {
        self.cursor
    }
}

impl<'a, S> Iterator for ScanPages<'a, S>
where
    S: AnnouncementSource + ?Sized,
{
    type Item = Result<ScanPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.scanner.scan_page(self.source, self.cursor, self.limit) {
            Ok(page) if page.scanned == 0 => {
                self.done = true;
                None
            }
            Ok(page) => {
                self.cursor = page.next_cursor;
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
