//! EventSink port - 診断イベントの受け口
//!
//! # 実装
//! - TracingEventSink: tracing に流す（デフォルト）
//! - RecordingEventSink: メモリに貯める（テスト用）
//! - NoopEventSink: 何もしない

use crate::domain::SessionEvent;

/// EventSink はセッションの診断イベントを記録
///
/// 同期・非ブロッキングであること（poller のロック内からは呼ばない）
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}
