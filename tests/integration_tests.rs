//! Integration tests for the dispatch core
//!
//! These tests verify:
//! - Layout rendering end to end (identity, escapes, wrappers)
//! - Deferred rendering across thread handoffs
//! - Rule routing with final/finalMinLevel scoping
//! - Filter chain outcomes
//! - Async queue overflow, flush barriers, and shutdown
//! - Retry composition

use rust_log_dispatch::prelude::*;
use rust_log_dispatch::queue::DEFAULT_SHUTDOWN_TIMEOUT;
use rust_log_dispatch::routing::WhenFilter;
use rust_log_dispatch::targets::MemoryTarget;
use rust_log_dispatch::LogEvent;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn sink() -> Arc<MemoryTarget> {
    Arc::new(MemoryTarget::new())
}

fn event(message: &str) -> Arc<LogEvent> {
    Arc::new(LogEvent::new("App", LogLevel::Info, message))
}

// ============================================================================
// Layouts
// ============================================================================

#[test]
fn test_template_without_placeholders_renders_verbatim() {
    let registry = RendererRegistry::with_defaults();
    for template in ["", "plain text", "spaces   kept", "100% literal"] {
        let layout = Layout::compile(template, &registry, CompileMode::Strict).unwrap();
        assert_eq!(layout.render(&event("x")), template);
    }
}

#[test]
fn test_layout_renders_identically_across_threads() {
    let registry = RendererRegistry::with_defaults();
    let layout = Arc::new(
        Layout::compile(
            "${level} ${logger} ${thread} ${message}",
            &registry,
            CompileMode::Strict,
        )
        .unwrap(),
    );
    assert!(layout.is_thread_agnostic());

    let event = event("cross-thread");
    let here = layout.render(&event);

    let layout_clone = Arc::clone(&layout);
    let event_clone = Arc::clone(&event);
    let there = std::thread::spawn(move || layout_clone.render(&event_clone))
        .join()
        .unwrap();

    assert_eq!(here, there);
}

#[test]
fn test_non_thread_agnostic_layout_precalculated_before_handoff() {
    // A renderer that reads the executing thread's name: rendering it
    // on the consumer thread would give the wrong answer unless the
    // queue pre-renders on the producer side
    struct ExecutingThreadRenderer;
    impl rust_log_dispatch::Renderer for ExecutingThreadRenderer {
        fn append(&self, buf: &mut String, _event: &LogEvent) -> Result<()> {
            buf.push_str(std::thread::current().name().unwrap_or("unnamed"));
            Ok(())
        }
        fn is_thread_agnostic(&self) -> bool {
            false
        }
        fn name(&self) -> &str {
            "executing-thread"
        }
    }

    let mut registry = RendererRegistry::with_defaults();
    registry.register(
        rust_log_dispatch::RendererSpec {
            name: "executing-thread",
            default_property: None,
            options: &[],
        },
        |_config| Ok(Box::new(ExecutingThreadRenderer) as Box<dyn rust_log_dispatch::Renderer>),
    );

    let layout =
        Layout::compile("${executing-thread}", &registry, CompileMode::Strict).unwrap();
    assert!(!layout.is_thread_agnostic());

    let inner = Arc::new(MemoryTarget::new().with_layout(layout));
    let queue = AsyncQueueTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        16,
        OverflowPolicy::default(),
    );

    let producer_name = std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string();
    queue.write(&event("deferred")).unwrap();
    queue.flush_timeout(Duration::from_secs(5)).unwrap();

    // The snapshot taken on the producer thread won the handoff
    assert_eq!(inner.messages(), vec![producer_name]);
    queue.shutdown(Duration::from_secs(1));
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_final_min_level_scoping_per_name_scope() {
    // [{"*", finalMinLevel=Info}, {"Service*", finalMinLevel=Warn}]
    // => "Service.Foo" suppresses Trace/Debug/Info from later rules,
    //    "Other" suppresses only Trace/Debug
    let later = sink();
    let factory = LogFactory::builder()
        .rule(
            Rule::builder("*")
                .unwrap()
                .final_min_level(LogLevel::Info)
                .build(),
        )
        .rule(
            Rule::builder("Service*")
                .unwrap()
                .final_min_level(LogLevel::Warn)
                .build(),
        )
        .rule(
            Rule::builder("*")
                .unwrap()
                .target(Arc::clone(&later) as Arc<dyn Target>)
                .build(),
        )
        .build();

    let service = factory.logger("Service.Foo");
    service.debug("suppressed");
    service.info("suppressed");
    service.warn("kept");
    assert_eq!(later.messages().len(), 1);
    assert!(later.messages()[0].contains("kept"));

    let other = factory.logger("Other");
    other.trace("suppressed");
    other.debug("suppressed");
    other.info("kept too");
    assert_eq!(later.messages().len(), 2);
    assert!(later.messages()[1].contains("kept too"));
}

#[test]
fn test_filter_chain_denies_matching_message() {
    // [(msg=="x", Ignore)], defaultAction=Log
    let sink = sink();
    let chain = FilterChain::new()
        .with_filter(
            WhenFilter::new("msg-is-x", |e: &LogEvent| e.message_template == "x"),
            FilterAction::Ignore,
        )
        .with_default_action(FilterAction::Log);
    let factory = LogFactory::builder()
        .rule(
            Rule::builder("*")
                .unwrap()
                .target(Arc::clone(&sink) as Arc<dyn Target>)
                .filters(chain)
                .build(),
        )
        .build();

    let logger = factory.logger("App");
    logger.info("x");
    logger.info("y");
    logger.info("x");

    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("y"));
}

#[test]
fn test_distinct_names_resolve_independently() {
    let db_sink = sink();
    let all_sink = sink();
    let factory = LogFactory::builder()
        .rule(
            Rule::builder("App.Db*")
                .unwrap()
                .target(Arc::clone(&db_sink) as Arc<dyn Target>)
                .final_rule(true)
                .build(),
        )
        .rule(
            Rule::builder("*")
                .unwrap()
                .target(Arc::clone(&all_sink) as Arc<dyn Target>)
                .build(),
        )
        .build();

    factory.logger("App.Db.Pool").info("db only");
    factory.logger("App.Web").info("everything else");

    assert_eq!(db_sink.messages().len(), 1);
    assert_eq!(all_sink.messages().len(), 1);
    assert!(all_sink.messages()[0].contains("everything else"));
}

// ============================================================================
// Async queue
// ============================================================================

#[test]
fn test_discard_queue_keeps_newest_in_order() {
    // Discard queue, capacity 2: enqueuing 5 events without draining
    // retains at most 2, in original order; the 3 oldest each receive
    // a discard completion
    let inner = sink();
    let queue = AsyncQueueTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        2,
        OverflowPolicy::Discard,
    );

    // Park the consumer inside a plug write so the queue cannot drain
    inner.block_writes();
    queue.write(&event("plug")).unwrap();
    while queue.pending() > 0 || inner.write_attempts() == 0 {
        std::thread::sleep(Duration::from_millis(1));
    }

    let discarded = Arc::new(Mutex::new(Vec::new()));
    for i in 0..5 {
        let discarded = Arc::clone(&discarded);
        let label = format!("m{}", i);
        queue.write_with_completion(
            event(&label),
            Box::new(move |result| {
                if matches!(result, Err(DispatchError::QueueDiscarded { .. })) {
                    discarded.lock().unwrap().push(label);
                }
            }),
        );
    }

    assert_eq!(queue.pending(), 2);
    assert_eq!(queue.metrics().discarded(), 3);

    inner.unblock_writes();
    queue.flush_timeout(Duration::from_secs(5)).unwrap();

    // The two newest survived, in original relative order
    let messages = inner.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].contains("plug"));
    assert!(messages[1].contains("m3"));
    assert!(messages[2].contains("m4"));

    // The three oldest were completed with the discard error
    assert_eq!(
        discarded.lock().unwrap().clone(),
        vec!["m0".to_string(), "m1".to_string(), "m2".to_string()]
    );
    queue.shutdown(Duration::from_secs(1));
}

#[test]
fn test_flush_barrier_covers_prior_events_only() {
    // N enqueues, then Flush, then M more: the N events are forwarded
    // before Flush returns, regardless of the M later enqueues
    const N: usize = 10;
    const M: usize = 10;

    let inner = sink();
    inner.set_write_delay(Duration::from_millis(2));
    let queue = Arc::new(AsyncQueueTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        1024,
        OverflowPolicy::default(),
    ));

    for i in 0..N {
        queue.write(&event(&format!("before-{}", i))).unwrap();
    }

    // Later producers keep enqueueing while the flush waits
    let producer_queue = Arc::clone(&queue);
    let producer = std::thread::spawn(move || {
        for i in 0..M {
            let _ = producer_queue.write(&event(&format!("after-{}", i)));
            std::thread::sleep(Duration::from_millis(1));
        }
    });

    queue.flush_timeout(Duration::from_secs(10)).unwrap();

    let messages = inner.messages();
    assert!(messages.len() >= N, "flush returned before the N events");
    for (i, message) in messages.iter().take(N).enumerate() {
        assert!(
            message.contains(&format!("before-{}", i)),
            "event {} out of order: {}",
            i,
            message
        );
    }

    producer.join().unwrap();
    assert_eq!(inner.flush_count(), 1);
    queue.shutdown(Duration::from_secs(5));
}

#[test]
fn test_block_with_timeout_fails_event_without_enqueueing() {
    let inner = sink();
    inner.block_writes();
    let queue = AsyncQueueTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        1,
        OverflowPolicy::Block {
            timeout: Some(Duration::from_millis(50)),
        },
    );

    // Plug the consumer, fill the single slot
    queue.write(&event("plug")).unwrap();
    while queue.pending() > 0 || inner.write_attempts() == 0 {
        std::thread::sleep(Duration::from_millis(1));
    }
    queue.write(&event("fills-slot")).unwrap();

    // Queue is full and the consumer is parked: this one times out
    let err = queue.write(&event("times-out")).unwrap_err();
    assert!(matches!(err, DispatchError::QueueTimeout { .. }));
    assert_eq!(queue.pending(), 1);
    assert_eq!(queue.metrics().timed_out(), 1);

    inner.unblock_writes();
    queue.flush_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(inner.messages().len(), 2);
    queue.shutdown(Duration::from_secs(1));
}

#[test]
fn test_shutdown_drains_then_rejects() {
    let inner = sink();
    let queue = AsyncQueueTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        64,
        OverflowPolicy::default(),
    );

    for i in 0..20 {
        queue.write(&event(&format!("m{}", i))).unwrap();
    }
    assert!(queue.shutdown(DEFAULT_SHUTDOWN_TIMEOUT));
    assert_eq!(inner.messages().len(), 20);

    let err = queue.write(&event("late")).unwrap_err();
    assert!(matches!(err, DispatchError::QueueShutdown));
}

#[test]
fn test_retry_layer_composes_under_queue() {
    let inner = sink();
    inner.fail_next_writes(2);
    let retry = Arc::new(RetryTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        3,
        Duration::from_millis(1),
    ));
    let queue = AsyncQueueTarget::new(
        retry as Arc<dyn Target>,
        16,
        OverflowPolicy::default(),
    );

    queue.write(&event("survives-retries")).unwrap();
    queue.flush_timeout(Duration::from_secs(5)).unwrap();

    assert_eq!(inner.messages().len(), 1);
    assert_eq!(inner.write_attempts(), 3);
    queue.shutdown(Duration::from_secs(1));
}

// ============================================================================
// End-to-end dispatch
// ============================================================================

#[test]
fn test_factory_routes_through_async_queue() {
    let inner = sink();
    let queue: Arc<dyn Target> = Arc::new(AsyncQueueTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        256,
        OverflowPolicy::default(),
    ));
    let factory = LogFactory::builder()
        .rule(
            Rule::builder("*")
                .unwrap()
                .min_level(LogLevel::Info)
                .target(Arc::clone(&queue))
                .build(),
        )
        .build();

    let logger = factory.logger("App.Main");
    for i in 0..50 {
        logger.info(format!("message {}", i));
    }
    logger.debug("below threshold");

    factory.flush_all(Duration::from_secs(5)).unwrap();
    assert_eq!(inner.messages().len(), 50);
}

#[test]
fn test_completion_failures_counted_not_thrown() {
    // A sink that always fails: the logging call itself must not error
    let inner = sink();
    inner.fail_next_writes(usize::MAX);
    let factory = LogFactory::builder()
        .rule(
            Rule::builder("*")
                .unwrap()
                .target(Arc::clone(&inner) as Arc<dyn Target>)
                .build(),
        )
        .build();

    let logger = factory.logger("App");
    logger.info("fails quietly");
    assert_eq!(factory.diagnostics().target_error_count(), 1);
    assert!(inner.messages().is_empty());
}

#[test]
fn test_layout_match_filter_uses_rendered_text() {
    let sink = sink();
    let factory = LogFactory::builder().build();
    let layout = factory.compile_layout("${event-properties:item=tenant}").unwrap();

    let chain = FilterChain::new()
        .with_filter(
            rust_log_dispatch::LayoutMatchFilter::new(layout, "blocked-tenant"),
            FilterAction::IgnoreFinal,
        )
        .with_default_action(FilterAction::Log);

    factory.reconfigure(vec![Rule::builder("*")
        .unwrap()
        .target(Arc::clone(&sink) as Arc<dyn Target>)
        .filters(chain)
        .build()]);

    let logger = factory.logger("App");
    logger.log_event(
        LogEvent::new("App", LogLevel::Info, "denied").with_property("tenant", "blocked-tenant"),
    );
    logger.log_event(
        LogEvent::new("App", LogLevel::Info, "allowed").with_property("tenant", "good-tenant"),
    );

    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("allowed"));
}

#[test]
fn test_write_with_completion_fires_exactly_once_per_event() {
    let inner = sink();
    let queue = AsyncQueueTarget::new(
        Arc::clone(&inner) as Arc<dyn Target>,
        8,
        OverflowPolicy::default(),
    );

    let fired = Arc::new(AtomicUsize::new(0));
    for i in 0..8 {
        let fired = Arc::clone(&fired);
        queue.write_with_completion(
            event(&format!("m{}", i)),
            Box::new(move |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            }),
        );
    }
    queue.flush_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 8);
    queue.shutdown(Duration::from_secs(1));
}
