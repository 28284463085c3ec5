//! Data generators for benchmarks

use fake::faker::lorem::en::Words;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use folio::collection::Document;
use folio::doc;
use rand::Rng;

pub const GENRES: [&str; 6] = ["dystopian", "novel", "satire", "science fiction", "poetry", "history"];

/// Authors drawn from a fixed pool so equality filters hit many books.
pub fn author_pool(size: usize) -> Vec<String> {
    (0..size)
        .map(|_| format!("{} {}", FirstName().fake::<String>(), LastName().fake::<String>()))
        .collect()
}

/// Generate book documents for CRUD, index and aggregation benchmarks
pub fn generate_books(count: usize) -> Vec<Document> {
    let authors = author_pool(50);
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let title: Vec<String> = Words(2..5).fake();
            let author = authors[rng.gen_range(0..authors.len())].clone();
            let genre = GENRES[rng.gen_range(0..GENRES.len())];
            let year: i64 = rng.gen_range(1900..2024);
            let price: f64 = rng.gen_range(5.0..50.0);

            doc! {
                seq: (i as i64),
                title: (title.join(" ")),
                author: (author),
                published_year: (year),
                genre: (genre),
                price: (price),
                stock: { warehouse: (rng.gen_range(0..500) as i64), store: (rng.gen_range(0..50) as i64) }
            }
        })
        .collect()
}

/// Generate a single book with a deterministic shape
pub fn generate_single_book(seq: usize) -> Document {
    doc! {
        seq: (seq as i64),
        title: (format!("Book {}", seq)),
        author: (format!("Author {}", seq % 100)),
        published_year: (1900 + (seq % 124) as i64),
        genre: (GENRES[seq % GENRES.len()]),
        price: (5.0 + (seq % 45) as f64),
    }
}
