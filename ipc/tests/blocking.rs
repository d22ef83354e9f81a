use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

use ipc::Mailbox;
use runtime::{spawn, yield_now, ThreadHandle};

static SERIAL: Mutex<()> = Mutex::new(());

fn exclusive_runtime() -> (MutexGuard<'static, ()>, ThreadHandle) {
    let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    // SAFETY: the guard keeps the other tests in this binary off the runtime.
    let boot = unsafe { runtime::bootstrap() };
    (guard, boot)
}

type Log<T> = Rc<RefCell<Vec<T>>>;

fn log<T>() -> Log<T> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn fibonacci_producer_feeds_consumer_in_order() {
    let (_guard, boot) = exclusive_runtime();
    let fib: Rc<Mailbox> = Rc::new(Mailbox::new());
    let received = log::<i64>();

    let mailbox = fib.clone();
    let producer = spawn("fibonacci", move || {
        let (mut a, mut b) = (1i64, 1i64);
        loop {
            mailbox.send(a);
            (a, b) = (b, a.wrapping_add(b));
        }
    });
    let mailbox = fib.clone();
    let sink = received.clone();
    let consumer = spawn("print_fibonacci", move || loop {
        let next = mailbox.receive();
        sink.borrow_mut().push(next);
    });

    // producer <-> consumer, with the bootstrap thread visiting once per round
    boot.link(producer);
    producer.link(consumer);
    consumer.link(boot);

    while received.borrow().len() < 10 {
        yield_now();
    }

    assert_eq!(received.borrow()[..10], [1, 1, 2, 3, 5, 8, 13, 21, 34, 55]);
}

#[test]
fn capacity_two_holds_exactly_one_pending_value() {
    let (_guard, _boot) = exclusive_runtime();
    let mailbox: Rc<Mailbox<i64, 2>> = Rc::new(Mailbox::new());
    let events = log::<&'static str>();

    let tx = mailbox.clone();
    let trace = events.clone();
    spawn("sender", move || {
        tx.send(1);
        trace.borrow_mut().push("sent 1");
        tx.send(2);
        trace.borrow_mut().push("sent 2");
    });

    yield_now();
    assert_eq!(*events.borrow(), ["sent 1"]);
    assert_eq!(mailbox.len(), 1);

    // the second send is stuck until a slot frees up
    yield_now();
    yield_now();
    assert_eq!(*events.borrow(), ["sent 1"]);
    assert!(mailbox.is_full());

    assert_eq!(mailbox.try_receive(), Some(1));
    yield_now();
    assert_eq!(*events.borrow(), ["sent 1", "sent 2"]);
    assert_eq!(mailbox.try_receive(), Some(2));
}

#[test]
fn sender_blocks_on_the_capacity_th_send() {
    let (_guard, _boot) = exclusive_runtime();
    const CAPACITY: usize = 5;
    let mailbox: Rc<Mailbox<usize, CAPACITY>> = Rc::new(Mailbox::new());
    let sent = Rc::new(RefCell::new(0usize));

    let tx = mailbox.clone();
    let count = sent.clone();
    spawn("flood", move || {
        for value in 0.. {
            tx.send(value);
            *count.borrow_mut() += 1;
        }
    });

    for _ in 0..10 {
        yield_now();
    }
    assert_eq!(*sent.borrow(), CAPACITY - 1);
    assert_eq!(mailbox.len(), CAPACITY - 1);

    assert_eq!(mailbox.receive(), 0);
    yield_now();
    assert_eq!(*sent.borrow(), CAPACITY);
    assert!(mailbox.is_full());
}

#[test]
fn receive_waits_for_a_matching_send() {
    let (_guard, _boot) = exclusive_runtime();
    let mailbox: Rc<Mailbox> = Rc::new(Mailbox::new());
    let received = log::<i64>();

    let rx = mailbox.clone();
    let sink = received.clone();
    spawn("waiter", move || loop {
        let value = rx.receive();
        sink.borrow_mut().push(value);
    });

    for _ in 0..5 {
        yield_now();
    }
    assert!(received.borrow().is_empty());

    mailbox.send(7);
    yield_now();
    assert_eq!(*received.borrow(), [7]);
}

#[test]
fn many_senders_and_receivers_preserve_send_order() {
    let (_guard, _boot) = exclusive_runtime();
    let mailbox: Rc<Mailbox<(usize, usize), 4>> = Rc::new(Mailbox::new());
    let sent = log::<(usize, usize)>();
    let received = log::<(usize, usize)>();

    for sender in 0..3 {
        let tx = mailbox.clone();
        let order = sent.clone();
        spawn("sender", move || {
            for seq in 0..20 {
                // a value counts as sent once it is committed; nothing runs in between
                tx.send((sender, seq));
                order.borrow_mut().push((sender, seq));
                if (sender + seq) % 3 == 0 {
                    yield_now();
                }
            }
        });
    }
    for _ in 0..2 {
        let rx = mailbox.clone();
        let sink = received.clone();
        spawn("receiver", move || loop {
            let value = rx.receive();
            sink.borrow_mut().push(value);
            yield_now();
        });
    }

    while received.borrow().len() < 60 {
        yield_now();
    }

    assert_eq!(*received.borrow(), *sent.borrow());
    for sender in 0..3 {
        let mine: Vec<usize> = received
            .borrow()
            .iter()
            .filter(|(from, _)| *from == sender)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!(mine, (0..20).collect::<Vec<_>>());
    }
}
