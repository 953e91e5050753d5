//! Listing and search across people and their documents.
//!
//! The listing is read from the database in display order; filtering is a
//! pure projection over owned values, so no search ever writes back to the
//! stored relationships.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::catalog::{document_from_row, person_from_row};
use crate::config::Config;
use crate::db;
use crate::models::PersonWithDocuments;

/// Every person (display-name ascending) with their documents in upload
/// order.
pub async fn list_people(pool: &SqlitePool) -> Result<Vec<PersonWithDocuments>> {
    let person_rows = sqlx::query(
        "SELECT id, unique_id, standard_name, display_name FROM people ORDER BY display_name ASC",
    )
    .fetch_all(pool)
    .await?;

    let mut results = Vec::with_capacity(person_rows.len());
    for row in &person_rows {
        let person = person_from_row(row);

        // rowid breaks ties between same-second uploads
        let doc_rows = sqlx::query(
            r#"
            SELECT id, document_name, filename_on_disk, category, date_uploaded, description, person_id
            FROM documents
            WHERE person_id = ?
            ORDER BY date_uploaded ASC, rowid ASC
            "#,
        )
        .bind(&person.id)
        .fetch_all(pool)
        .await?;

        let documents = doc_rows.iter().map(document_from_row).collect();
        results.push(PersonWithDocuments { person, documents });
    }

    Ok(results)
}

/// Applies the search term to a listing.
///
/// Empty or whitespace-only terms return the listing unchanged. Otherwise
/// the match is a case-insensitive substring test: a person is kept when
/// their display name or unique id matches, or when at least one of their
/// documents matches on name, category, or description. Kept people carry
/// only their matching documents.
pub fn filter_people(people: Vec<PersonWithDocuments>, term: &str) -> Vec<PersonWithDocuments> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return people;
    }

    people
        .into_iter()
        .filter_map(|entry| {
            let matching_docs: Vec<_> = entry
                .documents
                .into_iter()
                .filter(|doc| {
                    contains(&doc.document_name, &term)
                        || opt_contains(doc.category.as_deref(), &term)
                        || opt_contains(doc.description.as_deref(), &term)
                })
                .collect();

            let person_matches = contains(&entry.person.display_name, &term)
                || contains(&entry.person.unique_id, &term);

            if person_matches || !matching_docs.is_empty() {
                Some(PersonWithDocuments {
                    person: entry.person,
                    documents: matching_docs,
                })
            } else {
                None
            }
        })
        .collect()
}

fn contains(haystack: &str, lowered_term: &str) -> bool {
    haystack.to_lowercase().contains(lowered_term)
}

fn opt_contains(haystack: Option<&str>, lowered_term: &str) -> bool {
    haystack.map(|h| contains(h, lowered_term)).unwrap_or(false)
}

/// Full search operation: listing plus filtering.
pub async fn search_people(pool: &SqlitePool, term: &str) -> Result<Vec<PersonWithDocuments>> {
    let people = list_people(pool).await?;
    Ok(filter_people(people, term))
}

/// CLI entry point. Prints the projection to stdout.
pub async fn run_search(config: &Config, term: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let results = search_people(&pool, term).await?;

    if results.is_empty() {
        println!("No results.");
        pool.close().await;
        return Ok(());
    }

    for entry in &results {
        println!(
            "{} ({}) — {} document(s)",
            entry.person.display_name,
            entry.person.unique_id,
            entry.documents.len()
        );
        for doc in &entry.documents {
            let date = chrono::DateTime::from_timestamp(doc.date_uploaded, 0)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            println!(
                "    [{}] {} ({})",
                date,
                doc.document_name,
                doc.category.as_deref().unwrap_or("uncategorized")
            );
            if let Some(ref desc) = doc.description {
                println!("        {}", desc.replace('\n', " "));
            }
            println!("        id: {}", doc.id);
        }
        println!();
    }

    pool.close().await;
    Ok(())
}
