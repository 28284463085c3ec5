use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use fake::Fake;
use folio::collection::{Collection, Document};
use folio::doc;
use folio::errors::FolioResult;
use folio::Folio;
use rand::Rng;
use std::backtrace::Backtrace;
use std::thread;
use std::time::{Duration, Instant};

/// Runs a test with retry logic and error handling.
/// `after` always runs, including when the test body fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> FolioResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> FolioResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> FolioResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_error = Some(e.clone());
                last_backtrace = Some(bt);
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Error: {}", e);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = Some(Backtrace::capture().to_string());

                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Panic: {}", err_msg);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    db: Folio,
}

impl TestContext {
    pub fn new(db: Folio) -> Self {
        Self { db }
    }

    pub fn db(&self) -> Folio {
        self.db.clone()
    }
}

pub fn create_test_context() -> FolioResult<TestContext> {
    let db = Folio::builder().open()?;
    Ok(TestContext::new(db))
}

/// A context whose pipelines run through the `$match` reordering pass.
pub fn create_optimizing_test_context() -> FolioResult<TestContext> {
    let db = Folio::builder().optimize_pipelines(true).open()?;
    Ok(TestContext::new(db))
}

pub fn cleanup(ctx: TestContext) -> FolioResult<()> {
    ctx.db().close()
}

pub fn create_book_documents() -> Vec<Document> {
    vec![
        doc! { title: "1984", author: "George Orwell", published_year: 1949, genre: "dystopian", price: 9.99 },
        doc! { title: "Animal Farm", author: "George Orwell", published_year: 1945, genre: "satire", price: 7.5 },
        doc! { title: "Burmese Days", author: "George Orwell", published_year: 1934, genre: "novel", price: 12.0 },
        doc! { title: "Brave New World", author: "Aldous Huxley", published_year: 1932, genre: "dystopian", price: 8.25 },
        doc! { title: "Island", author: "Aldous Huxley", published_year: 1962, genre: "novel", price: 11.0 },
        doc! { title: "Fahrenheit 451", author: "Ray Bradbury", published_year: 1953, genre: "dystopian", price: 10.5 },
        doc! { title: "The Martian Chronicles", author: "Ray Bradbury", published_year: 1950, genre: "science fiction", price: 9.0 },
        doc! { title: "Dandelion Wine", author: "Ray Bradbury", published_year: 1957, genre: "novel", price: 6.75 },
    ]
}

pub fn insert_book_documents(collection: &Collection) -> FolioResult<()> {
    collection.insert_many(create_book_documents())?;
    Ok(())
}

/// Random books over a small author and genre domain so that equality
/// filters match several documents.
pub fn create_random_books(count: usize) -> Vec<Document> {
    const GENRES: [&str; 4] = ["dystopian", "novel", "satire", "science fiction"];
    let authors: Vec<String> = (0..8).map(|_| Name().fake()).collect();
    let mut rng = rand::rng();

    (0..count)
        .map(|_| {
            let title: Vec<String> = Words(2..5).fake();
            let author = authors[rng.random_range(0..authors.len())].clone();
            let genre = GENRES[rng.random_range(0..GENRES.len())];
            let year: i64 = rng.random_range(1900..2020);
            let price: f64 = rng.random_range(100..5000) as f64 / 100.0;
            doc! {
                title: (title.join(" ")),
                author: (author),
                published_year: (year),
                genre: (genre),
                price: (price),
            }
        })
        .collect()
}

pub fn is_sorted<T: PartialOrd>(iterable: impl IntoIterator<Item = T>, ascending: bool) -> bool {
    let mut iter = iterable.into_iter();
    if let Some(mut prev) = iter.next() {
        for current in iter {
            if (ascending && prev > current) || (!ascending && prev < current) {
                return false;
            }
            prev = current;
        }
    }
    true
}
