use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use ulid::Ulid;

use hotelbook::engine::{Engine, EngineError, NewBooking, NewHotel, NewRoomType};
use hotelbook::model::{GuestInfo, StayWindow};
use hotelbook::notify::NotifyHub;
use hotelbook::payment::{InMemoryPaymentGateway, IntentMetadata};

const OWNER: &str = "bench-owner";

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

struct Bench {
    engine: Arc<Engine>,
    payments: Arc<InMemoryPaymentGateway>,
}

impl Bench {
    fn open(name: &str) -> Self {
        let dir = std::env::temp_dir().join("hotelbook_bench");
        std::fs::create_dir_all(&dir).expect("create bench dir");
        let path = dir.join(format!("{name}_{}.wal", Ulid::new()));
        let payments = Arc::new(InMemoryPaymentGateway::new(false));
        let engine = Engine::new(path, payments.clone(), Arc::new(NotifyHub::new())).expect("open engine");
        Self {
            engine: Arc::new(engine),
            payments,
        }
    }

    async fn room_type(&self, numbers: usize) -> (Ulid, Ulid) {
        let hotel = self
            .engine
            .create_hotel(
                OWNER,
                NewHotel {
                    name: "Bench Hotel".into(),
                    city: "Bangkok".into(),
                    country: "Thailand".into(),
                },
            )
            .await
            .expect("create hotel");
        let rt = self
            .engine
            .create_room_type(
                OWNER,
                hotel.id,
                NewRoomType {
                    name: "Standard".into(),
                    description: String::new(),
                    price_per_night: PRICE_PER_NIGHT,
                    max_adults: 2,
                    max_children: 0,
                    facilities: Vec::new(),
                    image_urls: Vec::new(),
                    room_numbers: (0..numbers).map(|i| format!("{}", 100 + i)).collect(),
                },
            )
            .await
            .expect("create room type");
        (hotel.id, rt.id)
    }
}

const PRICE_PER_NIGHT: Decimal = Decimal::from_parts(900, 0, 0, false, 0);

fn window(offset: u64, nights: u64) -> StayWindow {
    let base = NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date");
    let check_in = base + Days::new(offset);
    StayWindow::new(check_in, check_in + Days::new(nights)).expect("non-empty window")
}

async fn book(
    engine: &Engine,
    payments: &InMemoryPaymentGateway,
    hotel_id: Ulid,
    room_type_id: Ulid,
    window: StayWindow,
) -> Result<(), EngineError> {
    let intent = format!("pi_bench_{}", Ulid::new());
    payments.insert_succeeded(
        &intent,
        PRICE_PER_NIGHT * Decimal::from(window.nights()),
        IntentMetadata {
            hotel_id,
            room_type_id,
            room_number_id: Ulid::nil(),
            user_id: "bench-guest".into(),
        },
    );
    engine
        .create_booking(
            "bench-guest",
            NewBooking {
                hotel_id,
                room_type_id,
                window,
                guest: GuestInfo {
                    first_name: "Bench".into(),
                    last_name: "Guest".into(),
                    email: "bench@example.com".into(),
                    phone: None,
                    citizen_id: None,
                },
                payment_intent_id: intent,
            },
        )
        .await
        .map(|_| ())
}

async fn phase1_sequential(bench: &Bench) {
    let (hotel_id, rt) = bench.room_type(10).await;
    let n = 2000;
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();

    // Ten numbers, one-night stays: each night fills up before moving on.
    for i in 0..n {
        let t = Instant::now();
        book(&bench.engine, &bench.payments, hotel_id, rt, window((i / 10) as u64, 1))
            .await
            .expect("sequential booking");
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} bookings in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("booking latency", &mut latencies);
}

async fn phase2_contended(bench: &Bench) {
    let numbers = 5;
    let (hotel_id, rt) = bench.room_type(numbers).await;
    let n_tasks = 200;
    let won = Arc::new(AtomicUsize::new(0));
    let sold_out = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..n_tasks {
        let engine = bench.engine.clone();
        let payments = bench.payments.clone();
        let won = won.clone();
        let sold_out = sold_out.clone();
        handles.push(tokio::spawn(async move {
            let t = Instant::now();
            match book(&engine, &payments, hotel_id, rt, window(0, 3)).await {
                Ok(()) => {
                    won.fetch_add(1, Ordering::Relaxed);
                }
                Err(EngineError::NoAvailability) => {
                    sold_out.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => eprintln!("unexpected error: {e}"),
            }
            t.elapsed()
        }));
    }

    let mut latencies = Vec::with_capacity(n_tasks);
    for h in handles {
        latencies.push(h.await.expect("booking task"));
    }

    let won = won.load(Ordering::Relaxed);
    println!(
        "  {n_tasks} guests racing for {numbers} rooms: {won} booked, {} sold out in {:.2}s",
        sold_out.load(Ordering::Relaxed),
        start.elapsed().as_secs_f64()
    );
    assert_eq!(won, numbers, "double booking detected");
    print_latency("contended booking latency", &mut latencies);
}

async fn phase3_read_under_load(bench: &Bench) {
    let (hotel_id, rt) = bench.room_type(20).await;
    for i in 0..200 {
        book(&bench.engine, &bench.payments, hotel_id, rt, window(i % 100, 2))
            .await
            .expect("prefill booking");
    }

    // Writers book into their own room types so reads see steady lock traffic.
    let stop = Arc::new(AtomicBool::new(false));
    let mut writers = Vec::new();
    for _ in 0..4 {
        let (w_hotel, w_rt) = bench.room_type(10).await;
        let engine = bench.engine.clone();
        let payments = bench.payments.clone();
        let stop = stop.clone();
        writers.push(tokio::spawn(async move {
            let mut i = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let _ = book(&engine, &payments, w_hotel, w_rt, window(i / 10 % 300, 1)).await;
                i += 1;
            }
        }));
    }

    let n_readers = 10;
    let reads_per_reader = 500;
    let mut readers = Vec::new();
    for r in 0..n_readers {
        let engine = bench.engine.clone();
        readers.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(reads_per_reader);
            for i in 0..reads_per_reader {
                let t = Instant::now();
                let _ = engine
                    .available_rooms(hotel_id, window(((r * 7 + i) % 120) as u64, 3))
                    .await
                    .expect("availability query");
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all = Vec::new();
    for h in readers {
        all.extend(h.await.expect("reader task"));
    }
    stop.store(true, Ordering::Relaxed);
    for h in writers {
        let _ = h.await;
    }
    print_latency("availability query", &mut all);
}

async fn phase4_compaction(bench: &Bench) {
    let appended = bench.engine.wal_appends_since_snapshot().await;
    let t = Instant::now();
    let events = bench.engine.compact_wal().await.expect("compaction");
    println!(
        "  {appended} appends compacted to {events} events in {:.2}ms",
        t.elapsed().as_secs_f64() * 1000.0
    );
}

#[tokio::main]
async fn main() {
    println!("=== hotelbook contention benchmark ===\n");
    let bench = Bench::open("contention");

    println!("[phase 1] sequential booking throughput");
    phase1_sequential(&bench).await;

    println!("\n[phase 2] many guests, one room type");
    phase2_contended(&bench).await;

    println!("\n[phase 3] availability latency under booking load");
    phase3_read_under_load(&bench).await;

    println!("\n[phase 4] WAL compaction");
    phase4_compaction(&bench).await;

    println!("\n=== done ===");
}
