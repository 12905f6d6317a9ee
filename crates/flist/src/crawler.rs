//! Depth-first remote tree walk.
//!
//! Discovery failures are isolated per branch: a directory that cannot
//! be entered or listed is logged and skipped, and the crawl carries on
//! with its siblings. Only connection establishment failures abort the
//! whole crawl, since without a session there is nothing left to try.

use protocol::{FileRecord, ListingParser, parse_name_only};
use session::{Connect, ConnectError, ConnectionManager, SessionError};

use crate::manifest::Manifest;

/// Remote tree walker over a managed session.
pub struct Crawler<'a, C: Connect> {
    manager: &'a mut ConnectionManager<C>,
    recursive: bool,
    try_degraded: bool,
}

impl<'a, C: Connect> Crawler<'a, C> {
    /// Creates a walker.
    ///
    /// With `recursive` off only the root directory is listed. With
    /// `try_degraded` on, a full listing that times out or loses the
    /// session is retried once as a name-only listing before the branch
    /// is given up.
    pub fn new(manager: &'a mut ConnectionManager<C>, recursive: bool, try_degraded: bool) -> Self {
        Self {
            manager,
            recursive,
            try_degraded,
        }
    }

    /// Walks the tree rooted at `root` and returns the mirror manifest.
    ///
    /// # Errors
    ///
    /// Only [`ConnectError`]; every other discovery failure skips the
    /// affected branch.
    pub fn crawl(&mut self, root: &str) -> Result<Manifest, ConnectError> {
        let mut records = Vec::new();
        self.visit(root, &mut records)?;
        let manifest = Manifest::new(records);
        tracing::info!(
            files = manifest.file_count(),
            total = manifest.len(),
            root,
            "crawl complete"
        );
        Ok(manifest)
    }

    fn visit(&mut self, path: &str, out: &mut Vec<FileRecord>) -> Result<(), ConnectError> {
        let entries = match self.list_dir(path) {
            Ok(entries) => entries,
            Err(SessionError::Connect(err)) => return Err(err),
            Err(err) => {
                tracing::warn!(path, error = %err, "skipping branch");
                return Ok(());
            }
        };
        tracing::debug!(path, count = entries.len(), "found entries");

        let start = out.len();
        out.extend(entries);

        if self.recursive {
            let subdirs: Vec<String> = out[start..]
                .iter()
                .filter(|record| record.is_dir())
                .map(FileRecord::remote_path)
                .collect();
            for dir in subdirs {
                self.visit(&dir, out)?;
            }
        }
        Ok(())
    }

    /// Lists one directory, falling back to a name-only listing when
    /// enabled and the full listing cost the session.
    fn list_dir(&mut self, path: &str) -> Result<Vec<FileRecord>, SessionError> {
        match self.full_listing(path) {
            Ok(records) => Ok(records),
            Err(err @ (SessionError::Expired(_) | SessionError::Lost(_))) if self.try_degraded => {
                tracing::warn!(path, error = %err, "full listing failed, trying name-only");
                self.degraded_listing(path)
            }
            Err(err) => Err(err),
        }
    }

    fn full_listing(&mut self, path: &str) -> Result<Vec<FileRecord>, SessionError> {
        let lines = self.manager.list(path)?;
        let mut parser = ListingParser::new();
        Ok(lines
            .iter()
            .filter_map(|line| parser.parse_line(line, path))
            .collect())
    }

    fn degraded_listing(&mut self, path: &str) -> Result<Vec<FileRecord>, SessionError> {
        let names = self.manager.name_list(path)?;
        Ok(names
            .iter()
            .filter_map(|name| parse_name_only(name, path))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use protocol::RecordKind;
    use session::SessionTimeouts;
    use test_support::{FakeConnector, FakeServer, listing_line};

    const STAMP: &str = "19-JAN-1994 14:32:11";

    fn timeouts() -> SessionTimeouts {
        SessionTimeouts {
            change_dir: Duration::from_secs(1),
            list: Duration::from_millis(50),
            degraded_list: Duration::from_millis(50),
            transfer: Duration::from_secs(1),
        }
    }

    fn manager(server: &FakeServer) -> ConnectionManager<FakeConnector> {
        ConnectionManager::new(server.connector(), timeouts())
    }

    fn crawl(
        server: &FakeServer,
        root: &str,
        recursive: bool,
        try_degraded: bool,
    ) -> Result<Manifest, ConnectError> {
        let mut manager = manager(server);
        Crawler::new(&mut manager, recursive, try_degraded).crawl(root)
    }

    #[test]
    fn flat_directory_lists_in_order() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("B.TXT;1", 2, STAMP));
        server.add_listing_line("/DISK0", &listing_line("A.TXT;1", 2, STAMP));

        let manifest = crawl(&server, "/DISK0", true, false).unwrap();
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn recursion_places_parent_entries_first() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("SUB.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0", &listing_line("ROOT.TXT;1", 2, STAMP));
        server.add_listing_line("/DISK0/SUB", &listing_line("INNER.TXT;1", 2, STAMP));

        let manifest = crawl(&server, "/DISK0", true, false).unwrap();
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SUB", "ROOT", "INNER"]);
        assert_eq!(manifest.records()[0].kind, RecordKind::Directory);
        assert_eq!(manifest.records()[2].parent, "/DISK0/SUB");
    }

    #[test]
    fn sibling_subtrees_visit_in_listing_order() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("ONE.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0", &listing_line("TWO.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0/ONE", &listing_line("FIRST.TXT;1", 2, STAMP));
        server.add_listing_line("/DISK0/TWO", &listing_line("SECOND.TXT;1", 2, STAMP));

        let manifest = crawl(&server, "/DISK0", true, false).unwrap();
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ONE", "TWO", "FIRST", "SECOND"]);
    }

    #[test]
    fn non_recursive_walk_stays_in_root() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("SUB.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0/SUB", &listing_line("INNER.TXT;1", 2, STAMP));

        let manifest = crawl(&server, "/DISK0", false, false).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(server.list_count(), 1);
    }

    #[test]
    fn unreachable_branch_is_skipped_not_fatal() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("BAD.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0", &listing_line("GOOD.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0/GOOD", &listing_line("KEEP.TXT;1", 2, STAMP));
        server.add_dir("/DISK0/BAD");
        server.reject_change_dir("/DISK0/BAD");

        let manifest = crawl(&server, "/DISK0", true, false).unwrap();
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["BAD", "GOOD", "KEEP"]);
    }

    #[test]
    fn listing_timeout_without_fallback_skips_branch() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("SLOW.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0", &listing_line("AFTER.DIR;1", 1, STAMP));
        server.add_listing_line("/DISK0/SLOW", &listing_line("LOST.TXT;1", 2, STAMP));
        server.add_listing_line("/DISK0/AFTER", &listing_line("KEEP.TXT;1", 2, STAMP));
        server.hang_list("/DISK0/SLOW");

        let manifest = crawl(&server, "/DISK0", true, false).unwrap();
        // The hung branch is dropped; its sibling is still fully listed,
        // on the session opened after the abandoned one.
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SLOW", "AFTER", "KEEP"]);
        assert_eq!(server.name_list_count(), 0);
        assert!(server.connect_count() >= 2);
    }

    #[test]
    fn listing_timeout_falls_back_to_name_only() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("SLOW.DIR;1", 1, STAMP));
        server.hang_list("/DISK0/SLOW");
        server.set_names("/DISK0/SLOW", &["KEPT.TXT;2", "Directory junk"]);

        let manifest = crawl(&server, "/DISK0", true, true).unwrap();
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SLOW", "KEPT"]);

        let kept = &manifest.records()[1];
        assert_eq!(kept.created, 0);
        assert_eq!(kept.version, 2);
        // The fallback runs on a fresh session after the abandoned one.
        assert!(server.connect_count() >= 2);
    }

    #[test]
    fn rejected_listing_never_falls_back() {
        // A negative reply is an answer, not a hang; retrying it as a
        // name-only listing would just repeat the refusal.
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("GONE.DIR;1", 1, STAMP));

        let manifest = crawl(&server, "/DISK0", true, true).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(server.name_list_count(), 0);
    }

    #[test]
    fn hanging_fallback_skips_the_branch() {
        let server = FakeServer::new();
        server.add_listing_line("/DISK0", &listing_line("SLOW.DIR;1", 1, STAMP));
        server.hang_list("/DISK0/SLOW");
        server.hang_name_list("/DISK0/SLOW");
        server.set_names("/DISK0/SLOW", &["NEVER.TXT;1"]);

        let manifest = crawl(&server, "/DISK0", true, true).unwrap();
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SLOW"]);
    }

    #[test]
    fn refused_connection_is_fatal() {
        let server = FakeServer::new();
        server.add_dir("/DISK0");
        server.refuse_connections();

        let err = crawl(&server, "/DISK0", true, false).unwrap_err();
        assert!(matches!(err, ConnectError::Refused { .. }));
    }
}
