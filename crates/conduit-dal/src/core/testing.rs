//! In-memory connector for exercising the provided contract methods.

use conduit_core::{Container, Error, Result};

use super::{AccessMode, Connector, ConnectorBase, Position};
use crate::url::EngineUrl;

pub(crate) struct MemoryConnector {
    base: ConnectorBase,
    source: Vec<Container>,
    cursor: usize,
    connected: bool,
    pub(crate) opened: usize,
    pub(crate) released: usize,
    pub(crate) written: Vec<Container>,
    pub(crate) fail_reads: bool,
}

impl MemoryConnector {
    pub(crate) fn new(engine_url: &str, access: AccessMode) -> Self {
        Self {
            base: ConnectorBase::new(engine_url, access),
            source: Vec::new(),
            cursor: 0,
            connected: false,
            opened: 0,
            released: 0,
            written: Vec::new(),
            fail_reads: false,
        }
    }

    pub(crate) fn reader(
        engine_url: &str,
        records: impl IntoIterator<Item = serde_json::Value>,
    ) -> Self {
        let mut connector = Self::new(engine_url, AccessMode::Read);
        connector.source = records
            .into_iter()
            .map(|record| Container::try_from(record).unwrap())
            .collect();
        connector
    }

    pub(crate) fn writer(engine_url: &str) -> Self {
        Self::new(engine_url, AccessMode::Write)
    }
}

impl Connector for MemoryConnector {
    fn access(&self) -> AccessMode {
        self.base.access()
    }

    fn raw_engine_url(&self) -> &str {
        self.base.raw_engine_url()
    }

    fn engine_url(&self) -> Result<&EngineUrl> {
        self.base.engine_url()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn open(&mut self) -> Result<()> {
        self.connected = true;
        self.cursor = 0;
        self.opened += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.connected = false;
        self.released += 1;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Container>> {
        if self.fail_reads {
            return Err(Error::io().with_message("simulated read failure"));
        }

        let record = self.source.get(self.cursor).cloned();
        if record.is_some() {
            self.cursor += 1;
        }
        Ok(record)
    }

    fn write_record(&mut self, record: Container) -> Result<()> {
        self.written.push(record);
        Ok(())
    }

    fn position(&self) -> Option<Position> {
        (self.cursor > 0).then(|| Position::new(self.cursor as u64, self.source.len() as u64))
    }
}
