//! In-memory mock of the sink contract.
//!
//! `MockWorkbook` keeps worksheets, rows, and permissions in a mutex-guarded
//! table and lets tests script failures: error texts queued for append or
//! rename calls are returned once each, in order, before normal behavior
//! resumes. All observations (rows, deletions, call counts, reorders) are
//! available to assertions without touching the engine's internals.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sheetlog::{LogRow, Permission, SheetId, SheetSink, SinkConnector, SinkError, WorksheetInfo};

#[derive(Debug, Clone)]
struct MockSheet {
    id: SheetId,
    title: String,
    rows: Vec<LogRow>,
}

#[derive(Debug, Default)]
struct WorkbookState {
    next_id: SheetId,
    sheets: Vec<MockSheet>,
    permissions: Vec<Permission>,
    append_errors: VecDeque<String>,
    rename_errors: VecDeque<String>,
    append_calls: usize,
    deleted_titles: Vec<String>,
    last_order: Option<Vec<SheetId>>,
    append_delay: Option<Duration>,
}

/// One open workbook backed by in-memory state.
#[derive(Debug, Default)]
pub struct MockWorkbook {
    state: Mutex<WorkbookState>,
}

#[allow(dead_code)]
impl MockWorkbook {
    pub fn new() -> Arc<Self> {
        Arc::new(MockWorkbook::default())
    }

    /// Workbook pre-populated with empty sheets of the given titles.
    pub fn with_sheets(titles: &[&str]) -> Arc<Self> {
        let workbook = MockWorkbook::new();
        for title in titles {
            workbook.add_sheet(title);
        }
        workbook
    }

    pub fn add_sheet(&self, title: &str) -> SheetId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.sheets.push(MockSheet {
            id,
            title: title.to_string(),
            rows: Vec::new(),
        });
        id
    }

    pub fn put_rows(&self, title: &str, rows: Vec<LogRow>) {
        let mut state = self.state.lock().unwrap();
        let sheet = state
            .sheets
            .iter_mut()
            .find(|s| s.title == title)
            .expect("sheet exists");
        sheet.rows = rows;
    }

    /// Queues an error text returned by the next `append_rows` call.
    pub fn push_append_error(&self, text: &str) {
        self.state
            .lock()
            .unwrap()
            .append_errors
            .push_back(text.to_string());
    }

    /// Queues an error text returned by the next `update_title` call.
    pub fn push_rename_error(&self, text: &str) {
        self.state
            .lock()
            .unwrap()
            .rename_errors
            .push_back(text.to_string());
    }

    /// Makes every append take at least this long.
    pub fn set_append_delay(&self, delay: Duration) {
        self.state.lock().unwrap().append_delay = Some(delay);
    }

    pub fn set_permissions(&self, permissions: Vec<Permission>) {
        self.state.lock().unwrap().permissions = permissions;
    }

    pub fn titles(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sheets
            .iter()
            .map(|s| s.title.clone())
            .collect()
    }

    pub fn rows_in(&self, title: &str) -> Vec<LogRow> {
        self.state
            .lock()
            .unwrap()
            .sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.rows.clone())
            .unwrap_or_default()
    }

    pub fn append_calls(&self) -> usize {
        self.state.lock().unwrap().append_calls
    }

    pub fn deleted_titles(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_titles.clone()
    }

    pub fn permissions(&self) -> Vec<Permission> {
        self.state.lock().unwrap().permissions.clone()
    }

    /// Titles in the order of the last `reorder_worksheets` call, if any.
    pub fn last_order_titles(&self) -> Option<Vec<String>> {
        let state = self.state.lock().unwrap();
        state.last_order.as_ref().map(|order| {
            order
                .iter()
                .map(|id| {
                    state
                        .sheets
                        .iter()
                        .find(|s| s.id == *id)
                        .map(|s| s.title.clone())
                        .unwrap_or_else(|| format!("<gone:{id}>"))
                })
                .collect()
        })
    }
}

fn info(sheet: &MockSheet) -> WorksheetInfo {
    WorksheetInfo {
        id: sheet.id,
        title: sheet.title.clone(),
        row_count: sheet.rows.len(),
    }
}

#[async_trait]
impl SheetSink for MockWorkbook {
    async fn list_worksheets(&self) -> Result<Vec<WorksheetInfo>, SinkError> {
        Ok(self.state.lock().unwrap().sheets.iter().map(info).collect())
    }

    async fn worksheet(&self, title: &str) -> Result<WorksheetInfo, SinkError> {
        self.state
            .lock()
            .unwrap()
            .sheets
            .iter()
            .find(|s| s.title == title)
            .map(info)
            .ok_or_else(|| SinkError::NotFound(title.to_string()))
    }

    async fn add_worksheet(
        &self,
        title: &str,
        _rows: usize,
        _cols: usize,
    ) -> Result<WorksheetInfo, SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.sheets.iter().any(|s| s.title == title) {
            return Err(SinkError::Backend(format!(
                "INVALID_ARGUMENT: a sheet named {title} already exists"
            )));
        }
        let id = state.next_id;
        state.next_id += 1;
        let sheet = MockSheet {
            id,
            title: title.to_string(),
            rows: Vec::new(),
        };
        let created = info(&sheet);
        state.sheets.push(sheet);
        Ok(created)
    }

    async fn append_rows(&self, sheet: SheetId, rows: &[LogRow]) -> Result<(), SinkError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.append_calls += 1;
            if let Some(text) = state.append_errors.pop_front() {
                return Err(SinkError::Backend(text));
            }
            let target = state
                .sheets
                .iter_mut()
                .find(|s| s.id == sheet)
                .ok_or_else(|| SinkError::Backend(format!("unknown sheet id {sheet}")))?;
            target.rows.extend_from_slice(rows);
            state.append_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn delete_worksheet(&self, sheet: SheetId) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .sheets
            .iter()
            .position(|s| s.id == sheet)
            .ok_or_else(|| SinkError::Backend(format!("unknown sheet id {sheet}")))?;
        let removed = state.sheets.remove(position);
        state.deleted_titles.push(removed.title);
        Ok(())
    }

    async fn update_title(&self, sheet: SheetId, title: &str) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if let Some(text) = state.rename_errors.pop_front() {
            return Err(SinkError::Backend(text));
        }
        if state
            .sheets
            .iter()
            .any(|s| s.title == title && s.id != sheet)
        {
            return Err(SinkError::Backend(format!(
                "INVALID_ARGUMENT: a sheet named {title} already exists"
            )));
        }
        let target = state
            .sheets
            .iter_mut()
            .find(|s| s.id == sheet)
            .ok_or_else(|| SinkError::Backend(format!("unknown sheet id {sheet}")))?;
        target.title = title.to_string();
        Ok(())
    }

    async fn reorder_worksheets(&self, order: &[SheetId]) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        let mut reordered = Vec::with_capacity(state.sheets.len());
        for id in order {
            let position = state
                .sheets
                .iter()
                .position(|s| s.id == *id)
                .ok_or_else(|| SinkError::Backend(format!("unknown sheet id {id}")))?;
            reordered.push(state.sheets.remove(position));
        }
        // Sheets not named keep their relative order at the end.
        reordered.append(&mut state.sheets);
        state.sheets = reordered;
        state.last_order = Some(order.to_vec());
        Ok(())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, SinkError> {
        Ok(self.state.lock().unwrap().permissions.clone())
    }

    async fn share(&self, email: &str, kind: &str, role: &str) -> Result<(), SinkError> {
        self.state.lock().unwrap().permissions.push(Permission {
            email: email.to_string(),
            role: role.to_string(),
            kind: kind.to_string(),
        });
        Ok(())
    }
}

/// Connector over a table of named in-memory workbooks.
#[derive(Debug, Default)]
pub struct MockConnector {
    workbooks: Mutex<HashMap<String, Arc<MockWorkbook>>>,
    created: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockConnector {
    pub fn new() -> Self {
        MockConnector::default()
    }

    pub fn insert(&self, name: &str, workbook: Arc<MockWorkbook>) {
        self.workbooks
            .lock()
            .unwrap()
            .insert(name.to_string(), workbook);
    }

    pub fn workbook(&self, name: &str) -> Option<Arc<MockWorkbook>> {
        self.workbooks.lock().unwrap().get(name).cloned()
    }

    /// Names passed to `create`, in call order.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl SinkConnector for MockConnector {
    async fn open(&self, workbook: &str) -> Result<Arc<dyn SheetSink>, SinkError> {
        self.workbooks
            .lock()
            .unwrap()
            .get(workbook)
            .cloned()
            .map(|wb| wb as Arc<dyn SheetSink>)
            .ok_or_else(|| SinkError::NotFound(workbook.to_string()))
    }

    async fn create(&self, workbook: &str) -> Result<Arc<dyn SheetSink>, SinkError> {
        // New workbooks come provisioned with the backend's default sheet.
        let created = MockWorkbook::with_sheets(&["Sheet1"]);
        self.workbooks
            .lock()
            .unwrap()
            .insert(workbook.to_string(), Arc::clone(&created));
        self.created.lock().unwrap().push(workbook.to_string());
        Ok(created as Arc<dyn SheetSink>)
    }
}
