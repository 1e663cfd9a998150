//! Scripted board service for tests.
//!
//! Holds a board in memory; pushes write into it, so a pull after a push
//! sees the pushed code.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{RemoteBoard, RemoteError};
use crate::domain::{BoardColumn, ColumnValue, Config, Item};

#[derive(Default)]
pub(crate) struct ScriptedBoard {
    pub configs: Mutex<Vec<Config>>,
    pub items: Mutex<Vec<Item>>,
    pub columns: Mutex<Vec<BoardColumn>>,
    /// Fail every call of these operations with this error
    pub failures: Mutex<HashMap<&'static str, RemoteError>>,
    /// Item ids whose push fails with a transport error
    pub rejected_pushes: Mutex<HashSet<String>>,
    pub pushed: Mutex<Vec<(String, String)>>,
    pub delay: Mutex<Option<Duration>>,
    pub item_fetches: AtomicUsize,
}

impl ScriptedBoard {
    pub fn with_board(config: Config, items: Vec<Item>) -> Self {
        let board = Self::default();
        *board.configs.lock().unwrap() = vec![config];
        *board.items.lock().unwrap() = items;
        board
    }

    pub fn fail(&self, operation: &'static str, err: RemoteError) {
        self.failures.lock().unwrap().insert(operation, err);
    }

    pub fn heal(&self, operation: &'static str) {
        self.failures.lock().unwrap().remove(operation);
    }

    pub fn reject_push(&self, item_id: &str) {
        self.rejected_pushes.lock().unwrap().insert(item_id.to_string());
    }

    pub fn accept_pushes(&self) {
        self.rejected_pushes.lock().unwrap().clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn pushed(&self) -> Vec<(String, String)> {
        self.pushed.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.item_fetches.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &'static str) -> Result<(), RemoteError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn barcode_column(&self) -> Option<String> {
        self.configs
            .lock()
            .unwrap()
            .first()
            .and_then(|c| c.barcode_column().map(str::to_string))
    }
}

#[async_trait]
impl RemoteBoard for ScriptedBoard {
    async fn fetch_configs(&self, board_id: &str) -> Result<Vec<Config>, RemoteError> {
        self.enter("configs").await?;
        Ok(self
            .configs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect())
    }

    async fn fetch_items(&self, board_id: &str, limit: usize) -> Result<Vec<Item>, RemoteError> {
        self.item_fetches.fetch_add(1, Ordering::SeqCst);
        self.enter("items").await?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.board_id == board_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_columns(&self, _board_id: &str) -> Result<Vec<BoardColumn>, RemoteError> {
        self.enter("columns").await?;
        Ok(self.columns.lock().unwrap().clone())
    }

    async fn update_barcode(&self, item_id: &str, barcode: &str) -> Result<(), RemoteError> {
        self.enter("push").await?;
        if self.rejected_pushes.lock().unwrap().contains(item_id) {
            return Err(RemoteError::Transport("connection reset".to_string()));
        }
        let column = self.barcode_column().unwrap_or_else(|| "barcode".to_string());
        if let Some(item) = self
            .items
            .lock()
            .unwrap()
            .iter_mut()
            .find(|i| i.id == item_id)
        {
            item.column_values
                .insert(column, ColumnValue::text(barcode));
        }
        self.pushed
            .lock()
            .unwrap()
            .push((item_id.to_string(), barcode.to_string()));
        Ok(())
    }
}
