//! Callback ordering and tool-call dispatch.
//!
//! Ordered callbacks (text, thinking, completion, error) are funneled
//! through an unbounded channel drained by a single worker task, so they
//! run strictly in submission order and never concurrently with each
//! other, no matter which stream context scheduled them. Tool-call jobs
//! are spawned as independent tasks and run concurrently; [`CallbackOrchestrator::await_all`]
//! joins both worlds.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::errors::{WatsonxError, WatsonxResult};
use crate::types::tools::ToolCall;

type OrderedFn = Box<dyn FnOnce() -> WatsonxResult<()> + Send>;
type ErrorSink = Arc<dyn Fn(WatsonxError) + Send + Sync>;

enum OrderedTask {
    Run(OrderedFn),
    Flush(oneshot::Sender<()>),
}

/// Serializes ordered callbacks and tracks concurrent tool-call jobs.
pub struct CallbackOrchestrator {
    tx: mpsc::UnboundedSender<OrderedTask>,
    jobs: Mutex<Vec<JoinHandle<()>>>,
    completed: Arc<Mutex<Vec<ToolCall>>>,
    error_sink: ErrorSink,
}

impl CallbackOrchestrator {
    /// Creates an orchestrator and spawns its worker task.
    ///
    /// Errors raised by ordered callbacks and tool-call jobs are routed to
    /// `error_sink` instead of propagating, so one failing callback cannot
    /// abort the chain for subsequent callbacks.
    pub fn new(error_sink: impl Fn(WatsonxError) + Send + Sync + 'static) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<OrderedTask>();
        let sink: ErrorSink = Arc::new(error_sink);
        let worker_sink = Arc::clone(&sink);

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                match task {
                    OrderedTask::Run(f) => {
                        if let Err(e) = f() {
                            worker_sink(e);
                        }
                    }
                    OrderedTask::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

        Self {
            tx,
            jobs: Mutex::new(Vec::new()),
            completed: Arc::new(Mutex::new(Vec::new())),
            error_sink: sink,
        }
    }

    /// Appends an ordered task to the sequential chain.
    ///
    /// Tasks scheduled at T1 < T2 execute in that order; no two ordered
    /// tasks ever run concurrently.
    pub fn schedule(&self, task: impl FnOnce() -> WatsonxResult<()> + Send + 'static) {
        let _ = self.tx.send(OrderedTask::Run(Box::new(task)));
    }

    /// Launches one tool-call job: intercept, deliver, record.
    ///
    /// Jobs run concurrently with each other and with ordered tasks. An
    /// interception failure skips delivery and records the original call;
    /// a delivery failure still records the intercepted call. Either
    /// failure goes to the error sink, so [`Self::await_all`] never hangs.
    pub fn schedule_tool_call(
        &self,
        call: ToolCall,
        intercept: impl FnOnce(ToolCall) -> WatsonxResult<ToolCall> + Send + 'static,
        deliver: impl FnOnce(&ToolCall) -> WatsonxResult<()> + Send + 'static,
    ) {
        let completed = Arc::clone(&self.completed);
        let sink = Arc::clone(&self.error_sink);

        let handle = tokio::spawn(async move {
            let recorded = match intercept(call.clone()) {
                Ok(intercepted) => {
                    if let Err(e) = deliver(&intercepted) {
                        sink(e);
                    }
                    intercepted
                }
                Err(e) => {
                    sink(e);
                    call
                }
            };
            completed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(recorded);
        });

        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Waits until every scheduled ordered task has run and every
    /// outstanding tool-call job has finished, then returns all processed
    /// tool calls.
    pub async fn await_all(&self) -> Vec<ToolCall> {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(OrderedTask::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }

        // An ordered task may itself schedule a tool-call job, so keep
        // draining until no new jobs appear.
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
                jobs.drain(..).collect()
            };
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                let _ = handle.await;
            }
        }

        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tools::ToolCall;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_call(id: &str) -> ToolCall {
        ToolCall::new(id, "get_weather", "{\"city\":\"Austin\"}")
    }

    #[tokio::test]
    async fn test_ordered_tasks_run_in_submission_order() {
        let orchestrator = CallbackOrchestrator::new(|_| {});
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..100 {
            let seen = Arc::clone(&seen);
            orchestrator.schedule(move || {
                seen.lock().unwrap().push(i);
                Ok(())
            });
        }
        orchestrator.await_all().await;

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failing_ordered_task_goes_to_sink_and_chain_continues() {
        let errors = Arc::new(AtomicUsize::new(0));
        let sink_errors = Arc::clone(&errors);
        let orchestrator =
            CallbackOrchestrator::new(move |_| {
                sink_errors.fetch_add(1, Ordering::SeqCst);
            });
        let ran_after = Arc::new(AtomicUsize::new(0));

        orchestrator.schedule(|| Err(WatsonxError::stream("handler failed")));
        let ran = Arc::clone(&ran_after);
        orchestrator.schedule(move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        orchestrator.await_all().await;

        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(ran_after.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_await_all_returns_every_tool_call() {
        let orchestrator = CallbackOrchestrator::new(|_| {});

        for i in 0..8 {
            orchestrator.schedule_tool_call(
                sample_call(&format!("tc-{i}")),
                Ok,
                |_| Ok(()),
            );
        }
        let calls = orchestrator.await_all().await;
        assert_eq!(calls.len(), 8);
    }

    #[tokio::test]
    async fn test_interception_rewrites_the_recorded_call() {
        let orchestrator = CallbackOrchestrator::new(|_| {});

        orchestrator.schedule_tool_call(
            sample_call("tc-1"),
            |mut call| {
                call.function.arguments = "{\"city\":\"Boston\"}".to_string();
                Ok(call)
            },
            |_| Ok(()),
        );
        let calls = orchestrator.await_all().await;
        assert_eq!(calls[0].function.arguments, "{\"city\":\"Boston\"}");
    }

    #[tokio::test]
    async fn test_interception_failure_skips_delivery_but_still_records() {
        let errors = Arc::new(AtomicUsize::new(0));
        let sink_errors = Arc::clone(&errors);
        let orchestrator =
            CallbackOrchestrator::new(move |_| {
                sink_errors.fetch_add(1, Ordering::SeqCst);
            });
        let delivered = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&delivered);
        orchestrator.schedule_tool_call(
            sample_call("tc-1"),
            |call| {
                Err(WatsonxError::Interception {
                    message: "rejected".to_string(),
                    tool_call_id: Some(call.id),
                })
            },
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        let calls = orchestrator.await_all().await;

        assert_eq!(calls.len(), 1);
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_still_records_the_call() {
        let errors = Arc::new(AtomicUsize::new(0));
        let sink_errors = Arc::clone(&errors);
        let orchestrator =
            CallbackOrchestrator::new(move |_| {
                sink_errors.fetch_add(1, Ordering::SeqCst);
            });

        orchestrator.schedule_tool_call(sample_call("tc-1"), Ok, |_| {
            Err(WatsonxError::stream("delivery failed"))
        });
        let calls = orchestrator.await_all().await;

        assert_eq!(calls.len(), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_await_all_waits_for_jobs_spawned_by_running_jobs() {
        let orchestrator = Arc::new(CallbackOrchestrator::new(|_| {}));
        let inner_ran = Arc::new(AtomicUsize::new(0));

        let chained = Arc::clone(&orchestrator);
        let counter = Arc::clone(&inner_ran);
        orchestrator.schedule_tool_call(sample_call("outer"), Ok, move |_| {
            // Delay so the join loop is already draining when the inner job
            // lands in the queue.
            std::thread::sleep(std::time::Duration::from_millis(10));
            chained.schedule_tool_call(sample_call("inner"), Ok, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        let calls = orchestrator.await_all().await;
        assert_eq!(inner_ran.load(Ordering::SeqCst), 1);
        assert_eq!(calls.len(), 2);
    }
}
