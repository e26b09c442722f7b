use std::sync::{Arc, Mutex};
use std::time::Duration;

use pledge_core::{
    ChannelQueue, FnThenable, ManualQueue, Promise, PromiseError, QueueConfig, Resolvable,
    Resolver, Scheduler, State,
};
use rstest::rstest;

fn setup() -> (Arc<ManualQueue>, Scheduler) {
    let queue = Arc::new(ManualQueue::new());
    let scheduler = Scheduler::new(queue.clone());
    (queue, scheduler)
}

fn counter() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn settles_at_most_once_and_handlers_run_once() {
    let (queue, scheduler) = setup();
    let p: Promise<&'static str> = Promise::new(&scheduler, |resolver| {
        resolver.fulfill("first");
        resolver.reject(PromiseError::rejected("second"));
        resolver.fulfill("third");
        Ok(())
    });

    let calls = counter();
    let on_f = calls.clone();
    let on_r = calls.clone();
    let _d: Promise<()> = p.then(
        move |v| {
            on_f.lock().unwrap().push(format!("fulfilled:{v}"));
            Ok(Resolvable::Value(()))
        },
        move |e| {
            on_r.lock().unwrap().push(format!("rejected:{e}"));
            Ok(Resolvable::Value(()))
        },
    );

    queue.run_until_idle().unwrap();
    assert_eq!(p.state(), State::Fulfilled);
    assert_eq!(*calls.lock().unwrap(), vec!["fulfilled:first".to_string()]);
}

#[test]
fn handlers_run_in_registration_order() {
    let (queue, scheduler) = setup();
    let d = Promise::<u32>::deferred(&scheduler);
    let calls = counter();

    for n in 0..5 {
        let log = calls.clone();
        let _ = d.promise.map(move |v| log.lock().unwrap().push(format!("{n}:{v}")));
    }
    d.fulfill(7);
    queue.run_until_idle().unwrap();

    let expected: Vec<String> = (0..5).map(|n| format!("{n}:7")).collect();
    assert_eq!(*calls.lock().unwrap(), expected);
}

#[test]
fn handler_registered_after_settlement_still_runs_once() {
    let (queue, scheduler) = setup();
    let p: Promise<i32> = Promise::resolve(&scheduler, Resolvable::Value(1));
    queue.run_until_idle().unwrap();

    let calls = counter();
    let log = calls.clone();
    let _ = p.map(move |v| log.lock().unwrap().push(v.to_string()));
    queue.run_until_idle().unwrap();
    queue.run_until_idle().unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["1".to_string()]);
}

#[rstest]
#[case::short(2)]
#[case::deep(50)]
fn pending_chain_flattens(#[case] depth: usize) {
    let (queue, scheduler) = setup();
    let links: Vec<_> = (0..depth)
        .map(|_| Promise::<&'static str>::deferred(&scheduler))
        .collect();

    for pair in links.windows(2) {
        pair[0].resolve(pair[1].promise.clone());
    }
    queue.run_until_idle().unwrap();
    assert_eq!(links[0].promise.state(), State::Pending);

    links[depth - 1].fulfill("end");
    queue.run_until_idle().unwrap();
    assert_eq!(links[0].promise.value(), Some("end"));
}

#[test]
fn continuations_returning_pending_promises_flatten() {
    let (queue, scheduler) = setup();
    let gates: Vec<_> = (0..50)
        .map(|_| Promise::<usize>::deferred(&scheduler))
        .collect();

    let mut tail: Promise<usize> = Promise::fulfilled(&scheduler, 0);
    for gate in &gates {
        let inner = gate.promise.clone();
        tail = tail.and_then(move |_| Ok(Resolvable::Promise(inner)));
    }
    queue.run_until_idle().unwrap();
    assert_eq!(tail.state(), State::Pending);

    for (n, gate) in gates.iter().enumerate() {
        gate.fulfill(n);
    }
    queue.run_until_idle().unwrap();
    assert_eq!(tail.outcome(), Some(Ok(49)));
}

#[test]
fn all_collects_values_in_input_order() {
    let (queue, scheduler) = setup();
    let inputs: Vec<Promise<i32>> = (1..=3).map(|v| Promise::fulfilled(&scheduler, v)).collect();
    let p = Promise::all(&scheduler, inputs);

    queue.run_until_idle().unwrap();
    assert_eq!(p.value(), Some(vec![1, 2, 3]));
}

#[test]
fn all_rejects_with_the_rejection() {
    let (queue, scheduler) = setup();
    let p = Promise::all(
        &scheduler,
        [
            Promise::fulfilled(&scheduler, 1),
            Promise::reject(&scheduler, PromiseError::rejected("x")),
            Promise::fulfilled(&scheduler, 3),
        ],
    );

    queue.run_until_idle().unwrap();
    assert_eq!(p.reason(), Some(PromiseError::rejected("x")));
}

#[test]
fn all_of_nothing_fulfills() {
    let (queue, scheduler) = setup();
    let p = Promise::all(&scheduler, Vec::<Promise<i32>>::new());

    queue.run_until_idle().unwrap();
    assert_eq!(p.state(), State::Fulfilled);
    assert_eq!(p.value(), Some(Vec::new()));
}

#[test]
fn race_settles_like_the_earliest_input() {
    let (queue, scheduler) = setup();
    let slow = Promise::<&'static str>::deferred(&scheduler);
    let fast = Promise::<&'static str>::deferred(&scheduler);
    let p = Promise::race(&scheduler, [slow.promise.clone(), fast.promise.clone()]);

    fast.fulfill("wins");
    queue.tick();
    slow.fulfill("a");
    queue.run_until_idle().unwrap();

    assert_eq!(p.value(), Some("wins"));
}

#[test]
fn circular_resolution_rejects() {
    let (queue, scheduler) = setup();
    let d = Promise::<i32>::deferred(&scheduler);
    d.resolve(d.promise.clone());

    queue.run_until_idle().unwrap();
    assert_eq!(
        d.promise.reason(),
        Some(PromiseError::CircularReference(d.promise.id()))
    );
}

#[test]
fn handler_error_becomes_the_exact_reason() {
    let (queue, scheduler) = setup();
    let p: Promise<i32> = Promise::fulfilled(&scheduler, 1);
    let d: Promise<i32> = p
        .and_then(|_| Err(PromiseError::rejected("boom")))
        .map(|v: i32| v + 1);

    queue.run_until_idle().unwrap();
    assert_eq!(d.reason(), Some(PromiseError::rejected("boom")));
}

#[test]
fn thenable_only_first_call_counts() {
    let (queue, scheduler) = setup();
    let foreign = FnThenable::new(|resolver: Resolver<i32, PromiseError>| {
        resolver.fulfill(1);
        resolver.fulfill(2);
        resolver.reject(PromiseError::rejected("late"));
        Err(PromiseError::rejected("after resolve"))
    });
    let p: Promise<i32> = Promise::resolve(&scheduler, Resolvable::thenable(foreign));

    queue.run_until_idle().unwrap();
    assert_eq!(p.value(), Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlers_agree_on_one_outcome() {
    let (queue, worker) = ChannelQueue::spawn(QueueConfig::default_v1().with_label("race"));
    let scheduler = Scheduler::new(queue);
    let d = Promise::<usize>::deferred(&scheduler);

    let mut tasks = Vec::new();
    for n in 0..16 {
        let handle = d.clone();
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis((n % 4) as u64)).await;
            handle.fulfill(n);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let first = d.promise.clone().await.unwrap();
    let again = d.promise.settled().await.unwrap();
    assert_eq!(first, again);
    assert!(first < 16);

    worker.shutdown_and_join().await.unwrap();
}
