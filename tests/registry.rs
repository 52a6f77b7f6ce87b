//! Registry behaviour: priorities, lookups, observers.

use std::sync::Arc;
use std::thread;

use hotconf::source::MemorySource;
use hotconf::{Config, ConfigError, PartialError, Value};
use serde_json::json;

mod common;

use common::{static_source, tree, Recorder};

#[test]
fn test_two_source_scenario() {
    let config = Config::default();
    config.add_source("s1", 0, static_source(json!({"a": 1}))).unwrap();
    config
        .add_source("s2", 1, static_source(json!({"a": 2, "b": 3})))
        .unwrap();

    assert_eq!(config.get("a"), Some(Value::Int(2)));
    assert_eq!(config.get("b"), Some(Value::Int(3)));

    config.remove_source("s2").unwrap();
    assert_eq!(config.get("a"), Some(Value::Int(1)));
    assert_eq!(config.get("b"), None);
}

#[test]
fn test_highest_priority_wins() {
    let config = Config::default();
    config.add_source("p1", 1, static_source(json!({"k": "one"}))).unwrap();
    config.add_source("p2", 2, static_source(json!({"k": "two"}))).unwrap();
    config.add_source("p0", 0, static_source(json!({"k": "zero"}))).unwrap();

    assert_eq!(config.string("k").unwrap(), "two");
    config.remove_source("p2").unwrap();
    assert_eq!(config.string("k").unwrap(), "one");
}

#[test]
fn test_nested_sources_merge_deeply() {
    let config = Config::default();
    config
        .add_source(
            "defaults",
            0,
            static_source(json!({"server": {"host": "0.0.0.0", "port": 80}})),
        )
        .unwrap();
    config
        .add_source("override", 1, static_source(json!({"server": {"port": 8080}})))
        .unwrap();

    assert_eq!(
        config.partial("server").unwrap(),
        tree(json!({"host": "0.0.0.0", "port": 8080}))
    );
}

#[test]
fn test_has_requires_nested_trees() {
    let config = Config::default();
    config
        .add_source("flat", 0, static_source(json!({"a": 1, "a.b": 2})))
        .unwrap();

    assert!(config.has("a"));
    assert!(!config.has("a.b"));
    assert_eq!(config.get_or("a.b", "fallback"), Value::from("fallback"));
}

#[test]
fn test_observer_fires_once_per_change() {
    let config = Config::default();
    let recorder = Recorder::default();
    config.add_observer("node", recorder.callback());
    assert_eq!(recorder.count(), 0);

    config
        .add_source("first", 0, static_source(json!({"node": "value"})))
        .unwrap();
    assert_eq!(recorder.calls(), vec![(None, Some(Value::from("value")))]);

    config
        .add_source("second", 1, static_source(json!({"node": "value", "other": 1})))
        .unwrap();
    assert_eq!(recorder.count(), 1);

    config
        .add_source("third", 2, static_source(json!({"node": "changed"})))
        .unwrap();
    assert_eq!(
        recorder.calls()[1],
        (Some(Value::from("value")), Some(Value::from("changed")))
    );
}

#[test]
fn test_observer_sees_removal() {
    let config = Config::default();
    config.add_source("s", 0, static_source(json!({"node": 1}))).unwrap();

    let recorder = Recorder::default();
    config.add_observer("node", recorder.callback());
    config.remove_source("s").unwrap();

    assert_eq!(recorder.calls(), vec![(Some(Value::Int(1)), None)]);
}

#[test]
fn test_unchanged_nan_does_not_notify() {
    let config = Config::default();
    let memory = Arc::new(MemorySource::default());
    memory.set("ratio", f64::NAN);
    config.add_source("memory", 0, memory.clone()).unwrap();

    let recorder = Recorder::default();
    config.add_observer("ratio", recorder.callback());

    for round in 0..3 {
        memory.set("other", round);
        assert!(config.reload());
    }
    assert_eq!(recorder.count(), 0);
}

#[test]
fn test_remove_observer() {
    let config = Config::default();
    let first = Recorder::default();
    let second = Recorder::default();
    config.add_observer("node", first.callback());
    config.add_observer("node", second.callback());

    assert!(config.remove_observer("node"));
    assert!(!config.remove_observer("missing"));

    config.add_source("s", 0, static_source(json!({"node": 1}))).unwrap();
    assert_eq!(first.count(), 0);
    assert_eq!(second.count(), 1);
}

#[test]
fn test_observer_can_reenter_registry() {
    let config = Arc::new(Config::default());
    let seen = Arc::new(std::sync::Mutex::new(None));

    let inner = Arc::downgrade(&config);
    let s = seen.clone();
    config.add_observer("node", move |_, _| {
        if let Some(config) = inner.upgrade() {
            *s.lock().unwrap() = config.get("node");
            config.remove_observer("node");
            config
                .add_source("from-callback", 10, static_source(json!({"extra": true})))
                .unwrap();
        }
    });

    config.add_source("s", 0, static_source(json!({"node": 5}))).unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(Value::Int(5)));
    assert!(config.bool("extra").unwrap());
    assert!(config.has_source("from-callback"));
}

#[test]
fn test_failed_mutations_leave_state() {
    let config = Config::default();
    config.add_source("a", 0, static_source(json!({"k": 1}))).unwrap();
    let before = config.snapshot();

    assert!(matches!(
        config.set_source_priority("ghost", 4),
        Err(ConfigError::UnknownSource(_))
    ));
    assert!(matches!(
        config.add_source("a", 1, static_source(json!({"k": 2}))),
        Err(ConfigError::DuplicateSource(_))
    ));
    config.remove_source("ghost").unwrap();

    assert_eq!(*config.snapshot(), *before);
    assert_eq!(config.source_ids(), vec!["a"]);
}

#[test]
fn test_typed_getters_on_registry() {
    let config = Config::default();
    config
        .add_source(
            "s",
            0,
            static_source(json!({"port": "eighty", "retries": 3, "ratio": 1})),
        )
        .unwrap();

    assert_eq!(config.int("retries").unwrap(), 3);
    assert_eq!(config.float("ratio").unwrap(), 1.0);
    assert_eq!(config.string_or("name", "svc").unwrap(), "svc");
    assert!(matches!(
        config.int_or("port", 80),
        Err(ConfigError::Partial(PartialError::TypeMismatch { .. }))
    ));
    assert!(matches!(
        config.int("missing"),
        Err(ConfigError::Partial(PartialError::Missing { .. }))
    ));
}

#[test]
fn test_populate_from_registry() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Server {
        host: String,
        port: u16,
    }

    let config = Config::default();
    config
        .add_source("s", 0, static_source(json!({"server": {"host": "h", "port": 1}})))
        .unwrap();

    let server: Server = config.populate("server").unwrap();
    assert_eq!(server, Server { host: "h".into(), port: 1 });
}

#[test]
fn test_concurrent_readers_and_writers() {
    let config = Arc::new(Config::default());
    config.add_source("base", 0, static_source(json!({"k": 0}))).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let config = config.clone();
            thread::spawn(move || {
                for round in 0..25 {
                    let id = format!("w{}-{}", i, round);
                    let source = Arc::new(MemorySource::new(tree(json!({"k": i + 1}))));
                    config.add_source(id.clone(), i + 1, source).unwrap();
                    config.remove_source(&id).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let config = config.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let k = config.int("k").unwrap();
                    assert!((0..=4).contains(&k));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
    assert_eq!(config.int("k").unwrap(), 0);
    assert_eq!(config.source_ids(), vec!["base"]);
}

#[test]
fn test_concurrent_notifications_arrive_in_order() {
    let config = Arc::new(Config::default());
    let recorder = Recorder::default();
    config.add_observer("k", recorder.callback());

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let config = config.clone();
            thread::spawn(move || {
                for round in 0..25 {
                    let id = format!("w{}-{}", i, round);
                    let source = static_source(json!({"k": i * 100 + round}));
                    config.add_source(id.clone(), i, source).unwrap();
                    config.remove_source(&id).unwrap();
                }
            })
        })
        .collect();
    for handle in writers {
        handle.join().unwrap();
    }

    let calls = recorder.calls();
    assert!(!calls.is_empty());
    let mut last = None;
    for (old, new) in calls {
        assert_eq!(old, last);
        assert_ne!(old, new);
        last = new;
    }
    assert_eq!(last, config.get("k"));
    assert_eq!(last, None);
}
