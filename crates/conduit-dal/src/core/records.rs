//! Lazy record iteration.

use std::iter::FusedIterator;

use conduit_core::{Container, Result};

use super::Connector;

/// Iterator over the records of a connector.
///
/// Yields each record as a mapping-shaped [`Container`]. Ends for good after
/// the source is exhausted or the first error.
pub struct Records<'a, C: Connector + ?Sized> {
    connector: &'a mut C,
    done: bool,
}

impl<'a, C: Connector + ?Sized> Records<'a, C> {
    pub(crate) fn new(connector: &'a mut C) -> Self {
        Self {
            connector,
            done: false,
        }
    }

    /// Progress of the underlying connector.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        self.connector.progress()
    }
}

impl<C: Connector + ?Sized> Iterator for Records<'_, C> {
    type Item = Result<Container>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.connector.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<C: Connector + ?Sized> FusedIterator for Records<'_, C> {}

impl<C: Connector + ?Sized> std::fmt::Debug for Records<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Records")
            .field("engine_url", &self.connector.raw_engine_url())
            .field("done", &self.done)
            .finish()
    }
}

/// Iteration helpers for every [`Connector`], including `dyn Connector`.
pub trait ConnectorExt: Connector {
    /// Starts iterating the records of this connector.
    ///
    /// Fails with `InvalidAccessMode` on a connector that cannot read, and
    /// connects first if needed.
    fn records(&mut self) -> Result<Records<'_, Self>> {
        if !self.access().can_read() {
            return Err(conduit_core::Error::invalid_access_mode().with_message(format!(
                "cannot iterate '{}' opened with access '{}'",
                self.raw_engine_url(),
                self.access()
            )));
        }

        self.connect()?;
        Ok(Records::new(self))
    }
}

impl<C: Connector + ?Sized> ConnectorExt for C {}

#[cfg(test)]
mod tests {
    use conduit_core::ErrorKind;
    use serde_json::json;

    use super::*;
    use crate::core::testing::MemoryConnector;

    #[test]
    fn test_records_yield_in_order() {
        let mut connector =
            MemoryConnector::reader("mem://a", [json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);

        let numbers: Vec<i64> = connector
            .records()
            .unwrap()
            .map(|record| record.unwrap()["n"].as_i64().unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_records_report_progress() {
        let mut connector = MemoryConnector::reader("mem://a", [json!({"n": 1}), json!({"n": 2})]);
        let mut records = connector.records().unwrap();

        assert_eq!(records.progress(), None);
        records.next().unwrap().unwrap();
        assert_eq!(records.progress(), Some(0.5));
        records.next().unwrap().unwrap();
        assert_eq!(records.progress(), Some(1.0));
        assert!(records.next().is_none());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_records_on_writer_fail() {
        let mut connector = MemoryConnector::writer("mem://a");
        let err = connector.records().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccessMode);
    }

    #[test]
    fn test_records_fuse_after_error() {
        let mut connector = MemoryConnector::reader("mem://a", [json!({"n": 1})]);
        connector.fail_reads = true;

        let mut records = connector.records().unwrap();
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_records_through_trait_object() {
        let mut connector: Box<dyn Connector> =
            Box::new(MemoryConnector::reader("mem://a", [json!({"n": 1})]));
        assert_eq!(connector.records().unwrap().count(), 1);
    }
}
