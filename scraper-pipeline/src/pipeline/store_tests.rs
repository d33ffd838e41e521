#[cfg(test)]
mod tests {
    use crate::pipeline::store::*;
    use crate::pipeline::traits::IngestHook;
    use scraper_core::{Measurement, ProbeError, StoreError};
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn ok(site: &str, secs: u64) -> Measurement {
        Measurement::success(site, Duration::from_secs(secs))
    }

    fn failed(site: &str) -> Measurement {
        Measurement::failure(site, ProbeError::Request("some".to_string()))
    }

    fn sites(store: &ResponseTimeStore) -> Vec<String> {
        store.snapshot().into_iter().map(|m| m.site).collect()
    }

    #[derive(Default)]
    struct CountingHook {
        counts: parking_lot::Mutex<HashMap<String, u32>>,
    }

    impl IngestHook for CountingHook {
        fn on_success(&self, measurement: &Measurement) {
            *self.counts.lock().entry(measurement.site.clone()).or_insert(0) += 1;
        }
    }

    #[test]
    fn test_ingest_sequence() {
        struct Case {
            name: &'static str,
            measurement: Measurement,
            sites: Vec<&'static str>,
            outcome: IngestOutcome,
            min: Option<&'static str>,
            max: Option<&'static str>,
        }

        let cases = vec![
            Case {
                name: "add_one",
                measurement: ok("google.ru", 1),
                sites: vec!["google.ru"],
                outcome: IngestOutcome::Inserted,
                min: Some("google.ru"),
                max: Some("google.ru"),
            },
            Case {
                name: "add_another",
                measurement: ok("yandex.ru", 2),
                sites: vec!["google.ru", "yandex.ru"],
                outcome: IngestOutcome::Inserted,
                min: Some("google.ru"),
                max: Some("yandex.ru"),
            },
            Case {
                name: "add_error",
                measurement: Measurement {
                    duration: Duration::from_secs(2),
                    ..failed("yandex.ru")
                },
                sites: vec!["google.ru"],
                outcome: IngestOutcome::Evicted,
                min: Some("google.ru"),
                max: Some("google.ru"),
            },
            Case {
                name: "add_error_twice",
                measurement: failed("yandex.ru"),
                sites: vec!["google.ru"],
                outcome: IngestOutcome::Ignored,
                min: Some("google.ru"),
                max: Some("google.ru"),
            },
            Case {
                name: "add_error_rest",
                measurement: failed("google.ru"),
                sites: vec![],
                outcome: IngestOutcome::Evicted,
                min: None,
                max: None,
            },
        ];

        let store = ResponseTimeStore::new();
        assert!(store.is_empty());

        for case in cases {
            let outcome = store.ingest(case.measurement);
            assert_eq!(outcome, case.outcome, "case {}", case.name);
            assert_eq!(sites(&store), case.sites, "case {}", case.name);

            match case.min {
                Some(site) => assert_eq!(store.min().unwrap().site, site, "case {}", case.name),
                None => assert_eq!(store.min(), Err(StoreError::NoAvailableSite)),
            }
            match case.max {
                Some(site) => assert_eq!(store.max().unwrap().site, site, "case {}", case.name),
                None => assert_eq!(store.max(), Err(StoreError::NoAvailableSite)),
            }
        }
    }

    #[test]
    fn test_empty_store_queries_fail() {
        let store = ResponseTimeStore::new();
        assert_eq!(store.min(), Err(StoreError::NoAvailableSite));
        assert_eq!(store.max(), Err(StoreError::NoAvailableSite));
        assert_eq!(store.random(), Err(StoreError::NoAvailableSite));
    }

    #[test]
    fn test_latest_success_overwrites() {
        let store = ResponseTimeStore::new();
        assert_eq!(store.ingest(ok("a.example", 5)), IngestOutcome::Inserted);
        assert_eq!(store.ingest(ok("a.example", 1)), IngestOutcome::Updated);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a.example").unwrap().duration, Duration::from_secs(1));
    }

    #[test]
    fn test_failure_for_unknown_site_is_noop() {
        let store = ResponseTimeStore::new();
        store.ingest(ok("a.example", 1));

        assert_eq!(store.ingest(failed("b.example")), IngestOutcome::Ignored);
        assert_eq!(sites(&store), vec!["a.example"]);
    }

    #[test]
    fn test_min_max_bound_every_entry() {
        let store = ResponseTimeStore::new();
        for (i, millis) in [120u64, 15, 900, 15, 47, 333, 901, 2].iter().enumerate() {
            store.ingest(Measurement::success(
                format!("site-{}.example", i),
                Duration::from_millis(*millis),
            ));
        }

        let min = store.min().unwrap();
        let max = store.max().unwrap();
        for entry in store.snapshot() {
            assert!(min.duration <= entry.duration);
            assert!(max.duration >= entry.duration);
        }
        assert_eq!(min.duration, Duration::from_millis(2));
        assert_eq!(max.site, "site-6.example");
    }

    #[test]
    fn test_min_tie_returns_one_of_tied_sites() {
        let store = ResponseTimeStore::new();
        store.ingest(ok("a.example", 1));
        store.ingest(ok("b.example", 1));
        store.ingest(ok("c.example", 3));

        // 平局时返回哪个站点不做保证
        let min = store.min().unwrap();
        assert!(min.site == "a.example" || min.site == "b.example");
    }

    #[test]
    fn test_random_single_entry() {
        let store = ResponseTimeStore::new();
        store.ingest(ok("only.example", 1));
        for _ in 0..10 {
            assert_eq!(store.random().unwrap().site, "only.example");
        }
    }

    #[test]
    fn test_random_is_uniform() {
        let store = ResponseTimeStore::new();
        let names = ["a.example", "b.example", "c.example", "d.example"];
        for (i, name) in names.iter().enumerate() {
            store.ingest(ok(name, i as u64 + 1));
        }

        let rounds = 40_000;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..rounds {
            *counts.entry(store.random().unwrap().site).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), names.len());
        for name in names {
            let frequency = counts[name] as f64 / rounds as f64;
            assert!(
                (0.2..0.3).contains(&frequency),
                "{} selected with frequency {}",
                name,
                frequency
            );
        }
    }

    #[test]
    fn test_hook_only_sees_successes() {
        let hook = Arc::new(CountingHook::default());
        let store = ResponseTimeStore::with_hook(hook.clone());

        store.ingest(ok("a.example", 1));
        store.ingest(ok("a.example", 2));
        store.ingest(failed("a.example"));
        store.ingest(failed("b.example"));

        let counts = hook.counts.lock();
        assert_eq!(counts.get("a.example"), Some(&2));
        assert_eq!(counts.get("b.example"), None);
    }

    #[test]
    fn test_concurrent_ingestion_per_producer_order() {
        let store = Arc::new(ResponseTimeStore::new());
        let producers = 8;
        let sites_per_producer = 50;

        std::thread::scope(|scope| {
            for p in 0..producers {
                let store = store.clone();
                scope.spawn(move || {
                    for s in 0..sites_per_producer {
                        let site = format!("p{}-s{}.example", p, s);
                        store.ingest(Measurement::success(site.clone(), Duration::from_millis(10)));
                        store.ingest(Measurement::success(site.clone(), Duration::from_millis(s as u64)));
                        // 奇数站点最终失败，应被移除
                        if s % 2 == 1 {
                            store.ingest(failed(&site));
                        }
                        let _ = store.min();
                        let _ = store.random();
                    }
                });
            }
        });

        let expected: HashSet<String> = (0..producers)
            .flat_map(|p| {
                (0..sites_per_producer)
                    .filter(|s| s % 2 == 0)
                    .map(move |s| format!("p{}-s{}.example", p, s))
            })
            .collect();
        let actual: HashSet<String> = sites(&store).into_iter().collect();
        assert_eq!(actual, expected);

        for entry in store.snapshot() {
            let s: u64 = entry.site.split("-s").nth(1).unwrap().trim_end_matches(".example").parse().unwrap();
            assert_eq!(entry.duration, Duration::from_millis(s));
        }
    }

    #[tokio::test]
    async fn test_listen_until_queue_closed() {
        let store = ResponseTimeStore::new();
        let (tx, rx) = mpsc::channel(4);

        let producer = tokio::spawn(async move {
            tx.send(ok("google.ru", 1)).await.unwrap();
            tx.send(ok("yandex.ru", 2)).await.unwrap();
            tx.send(failed("yandex.ru")).await.unwrap();
        });

        let ingested = store.listen(rx, CancellationToken::new()).await;
        producer.await.unwrap();

        assert_eq!(ingested, 3);
        assert_eq!(sites(&store), vec!["google.ru"]);
    }

    #[tokio::test]
    async fn test_listen_stops_on_cancel() {
        let store = Arc::new(ResponseTimeStore::new());
        let (tx, rx) = mpsc::channel::<Measurement>(1);
        let token = CancellationToken::new();

        let listener = {
            let store = store.clone();
            let token = token.clone();
            tokio::spawn(async move { store.listen(rx, token).await })
        };

        tx.send(ok("a.example", 1)).await.unwrap();
        token.cancel();

        let ingested = tokio::time::timeout(Duration::from_secs(1), listener)
            .await
            .unwrap()
            .unwrap();
        assert!(ingested <= 1);
        drop(tx);
    }
}
