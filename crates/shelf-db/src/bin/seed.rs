//! # Catalog Seeder
//!
//! Fills the database with a starter catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./shelf.db
//! cargo run -p shelf-db --bin seed
//!
//! # Seed another file and create a staff account
//! cargo run -p shelf-db --bin seed -- --db ./data/shelf.db --superuser admin --password admin
//! ```
//!
//! Running it twice is safe: categories and books are looked up by title
//! and only missing ones are inserted.

use anyhow::{bail, Context, Result};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shelf_core::{NewBook, DEFAULT_BOOK_STOCK};
use shelf_db::{Database, DbConfig};

struct SeedBook {
    title: &'static str,
    author: &'static str,
    price: i64,
    image: &'static str,
    description: &'static str,
}

const fn book(
    title: &'static str,
    author: &'static str,
    price: i64,
    image: &'static str,
    description: &'static str,
) -> SeedBook {
    SeedBook {
        title,
        author,
        price,
        image,
        description,
    }
}

/// Starter catalog: category title → books. Prices in whole currency units.
const CATALOG: &[(&str, &[SeedBook])] = &[
    (
        "Фантастика",
        &[
            book(
                "Дюна",
                "Фрэнк Герберт",
                850,
                "https://m.media-amazon.com/images/I/41-K7-5yYpL._SX322_BO1,204,203,200_.jpg",
                "Эпическая сага о песчаной планете Арракис, политических интригах и судьбе вселенной.",
            ),
            book(
                "Марсианин",
                "Энди Вейер",
                600,
                "https://m.media-amazon.com/images/I/517I2g+K6WL._SY344_BO1,204,203,200_.jpg",
                "История выживания астронавта, оставленного на Марсе в одиночестве.",
            ),
            book(
                "451 градус по Фаренгейту",
                "Рэй Брэдбери",
                450,
                "https://m.media-amazon.com/images/I/41wI-t4yqnL._SY291_BO1,204,203,200_QL40_ML2_.jpg",
                "Антиутопия о мире, где книги запрещены, а пожарные сжигают их.",
            ),
        ],
    ),
    (
        "Детективы",
        &[
            book(
                "Шерлок Холмс. Полное собрание",
                "Артур Конан Дойл",
                1200,
                "https://m.media-amazon.com/images/I/51r0M+3m6FL._SY344_BO1,204,203,200_.jpg",
                "Классические расследования величайшего сыщика всех времен.",
            ),
            book(
                "Убийство в Восточном экспрессе",
                "Агата Кристи",
                550,
                "https://m.media-amazon.com/images/I/51oVTRsjcqL._SY291_BO1,204,203,200_QL40_ML2_.jpg",
                "Эркюль Пуаро расследует загадочное убийство в занесенном снегом поезде.",
            ),
            book(
                "Девушка с татуировкой дракона",
                "Стиг Ларссон",
                700,
                "https://m.media-amazon.com/images/I/51L8+4y2qRL._SY344_BO1,204,203,200_.jpg",
                "Захватывающий триллер о журналисте и хакере, расследующих исчезновение.",
            ),
        ],
    ),
    (
        "Психология",
        &[
            book(
                "Думай медленно... решай быстро",
                "Даниэль Канеман",
                950,
                "https://m.media-amazon.com/images/I/41shf1+Gv+L._SY344_BO1,204,203,200_.jpg",
                "Книга нобелевского лауреата о том, как работает наше мышление и почему мы совершаем ошибки.",
            ),
            book(
                "Игры, в которые играют люди",
                "Эрик Берн",
                500,
                "https://m.media-amazon.com/images/I/51y-Xj-yG+L._SY344_BO1,204,203,200_.jpg",
                "Культовая книга о психологии человеческих взаимоотношений.",
            ),
        ],
    ),
    (
        "Классика",
        &[
            book(
                "Мастер и Маргарита",
                "Михаил Булгаков",
                600,
                "https://m.media-amazon.com/images/I/51w9WwKjL+L._SY344_BO1,204,203,200_.jpg",
                "Мистический роман о визите дьявола в Москву и трагической любви.",
            ),
            book(
                "Преступление и наказание",
                "Федор Достоевский",
                550,
                "https://m.media-amazon.com/images/I/41-eK8g+1LL._SY344_BO1,204,203,200_.jpg",
                "Психологическая драма о преступлении студента Раскольникова.",
            ),
            book(
                "Гордость и предубеждение",
                "Джейн Остин",
                480,
                "https://m.media-amazon.com/images/I/41+eK8g+1LL._SY344_BO1,204,203,200_.jpg",
                "Остроумный роман о нравах английского общества и любви мистера Дарси и Элизабет.",
            ),
        ],
    ),
    (
        "Бизнес",
        &[
            book(
                "Богатый папа, бедный папа",
                "Роберт Кийосаки",
                700,
                "https://m.media-amazon.com/images/I/51AHZGhzZEL._SY344_BO1,204,203,200_.jpg",
                "Книга о финансовой грамотности, которая изменила жизни миллионов.",
            ),
            book(
                "Самый богатый человек в Вавилоне",
                "Джордж Клейсон",
                400,
                "https://m.media-amazon.com/images/I/51+GySc8ExL._SY344_BO1,204,203,200_.jpg",
                "Простые и эффективные законы обращения с деньгами.",
            ),
        ],
    ),
];

struct Args {
    db_path: String,
    superuser: Option<String>,
    password: Option<String>,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = Args {
        db_path: String::from("./shelf.db"),
        superuser: None,
        password: None,
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" | "-d" => args.db_path = iter.next().context("--db needs a path")?,
            "--superuser" => args.superuser = Some(iter.next().context("--superuser needs a name")?),
            "--password" => args.password = Some(iter.next().context("--password needs a value")?),
            "--help" | "-h" => {
                println!("Shelf catalog seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./shelf.db)");
                println!("      --superuser <NAME>   Also create a staff account");
                println!("      --password <PW>      Password for the staff account");
                println!("  -h, --help               Show this help message");
                return Ok(None);
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    if args.superuser.is_some() && args.password.is_none() {
        bail!("--superuser requires --password");
    }

    Ok(Some(args))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seed=info,shelf_db=info")),
        )
        .init();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let db = Database::new(DbConfig::new(&args.db_path))
        .await
        .with_context(|| format!("opening {}", args.db_path))?;

    let mut categories_created = 0;
    let mut books_created = 0;

    for (category_title, books) in CATALOG {
        let category = match db.categories().find_by_title(category_title).await? {
            Some(existing) => existing,
            None => {
                categories_created += 1;
                db.categories().create(category_title).await?
            }
        };

        for seed in books.iter() {
            if db.books().find_by_title(seed.title).await?.is_some() {
                continue;
            }

            db.books()
                .create(&NewBook {
                    category_id: category.id,
                    title: seed.title.to_string(),
                    author: seed.author.to_string(),
                    description: seed.description.to_string(),
                    price_cents: seed.price * 100,
                    image_url: Some(seed.image.to_string()),
                    stock: DEFAULT_BOOK_STOCK,
                })
                .await
                .with_context(|| format!("inserting {}", seed.title))?;
            books_created += 1;
        }
    }

    info!(categories_created, books_created, total_books = db.books().count().await?, "Catalog seeded");

    if let (Some(username), Some(password)) = (args.superuser, args.password) {
        match db.users().find_by_username(&username).await? {
            Some(existing) => {
                db.users().set_superuser(existing.id, true).await?;
                warn!(username = %username, "User already exists, granted staff rights");
            }
            None => {
                let user = db.users().create(&username, &password, true).await?;
                info!(user_id = user.id, username = %user.username, "Superuser created");
            }
        }
    }

    db.close().await;
    Ok(())
}
