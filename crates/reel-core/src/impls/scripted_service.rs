//! ScriptedTaskService - 台本通りに応答する TaskService（テスト・デモ用）
//!
//! # 使い方
//! - `accept_as` / `reject_with` で submit の結果を積む（尽きたら `task-{n}` を発行）
//! - `script` で task ごとの status 応答列を積む（尽きたら pending を返し続ける）
//! - `gated()` にすると status 応答は `release` されるまで保留される
//! - `hold_submits()` にすると submit 応答は `release_submits` されるまで保留される

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{PendingUpload, ServiceError, StatusReport, TaskHandle};
use crate::ports::TaskService;

#[derive(Default)]
struct Script {
    submits: VecDeque<Result<TaskHandle, ServiceError>>,
    statuses: HashMap<TaskHandle, VecDeque<Result<StatusReport, ServiceError>>>,
    uploads: Vec<String>,
    issued: u32,
}

#[derive(Default)]
pub struct ScriptedTaskService {
    script: Mutex<Script>,
    status_calls: AtomicU32,
    gate: Option<Semaphore>,
    submit_gate: Option<Semaphore>,
}

impl ScriptedTaskService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status answers wait for a permit handed out by [`release`](Self::release).
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Submit answers wait for [`release_submits`](Self::release_submits).
    pub fn hold_submits(mut self) -> Self {
        self.submit_gate = Some(Semaphore::new(0));
        self
    }

    pub fn accept_as(self, task_id: &str) -> Self {
        let handle = TaskHandle::new(task_id);
        self.lock().submits.push_back(
            handle.ok_or_else(|| ServiceError::Malformed("response carried an empty taskId".into())),
        );
        self
    }

    pub fn reject_with(self, error: ServiceError) -> Self {
        self.lock().submits.push_back(Err(error));
        self
    }

    pub fn script<I>(self, task_id: &str, answers: I) -> Self
    where
        I: IntoIterator<Item = Result<StatusReport, ServiceError>>,
    {
        if let Some(handle) = TaskHandle::new(task_id) {
            self.lock()
                .statuses
                .entry(handle)
                .or_default()
                .extend(answers);
        }
        self
    }

    /// Lets `n` held status answers through.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn release_submits(&self, n: usize) {
        if let Some(gate) = &self.submit_gate {
            gate.add_permits(n);
        }
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// File names of every upload that reached `submit`.
    pub fn uploads(&self) -> Vec<String> {
        self.lock().uploads.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TaskService for ScriptedTaskService {
    async fn submit(&self, upload: &PendingUpload) -> Result<TaskHandle, ServiceError> {
        if let Some(gate) = &self.submit_gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }

        let mut script = self.lock();
        script.uploads.push(upload.file_name().to_string());
        match script.submits.pop_front() {
            Some(result) => result,
            None => {
                script.issued += 1;
                let id = format!("task-{}", script.issued);
                TaskHandle::new(id).ok_or_else(|| ServiceError::Malformed("empty task id".into()))
            }
        }
    }

    async fn status(&self, task: &TaskHandle) -> Result<StatusReport, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        // lock is taken only after the gate so it is never held across an await
        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }

        self.lock()
            .statuses
            .get_mut(task)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(StatusReport::pending()))
    }
}
