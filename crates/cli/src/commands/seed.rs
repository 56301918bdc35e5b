//! Seed the catalog and FAQ from YAML files.
//!
//! ```yaml
//! # catalog.yaml
//! products:
//!   - name: Voltio Urban S
//!     category: scooters
//!     price: "18999.00"
//!     stock: 12
//!     autonomy_km: 45
//!
//! # faqs.yaml
//! faqs:
//!   - question: ¿Cuánto tarda la carga?
//!     answer: Entre 4 y 8 horas en un contacto doméstico.
//!     category: carga
//! ```
//!
//! Products are matched by name, so re-running updates them in place. FAQs
//! whose question already exists are skipped.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use voltio_storefront::db::{FaqRepository, ProductRepository};
use voltio_storefront::models::{FaqInput, ProductInput};

use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<ProductInput>,
}

#[derive(Debug, Deserialize)]
struct FaqFile {
    faqs: Vec<FaqInput>,
}

/// Validate every product, reporting all problems at once.
fn validate_products(products: Vec<ProductInput>) -> Result<Vec<ProductInput>, Vec<String>> {
    let mut valid = Vec::with_capacity(products.len());
    let mut problems = Vec::new();

    for (index, product) in products.into_iter().enumerate() {
        let label = format!("product #{} ({})", index + 1, product.name.trim());
        match product.validate() {
            Ok(product) => valid.push(product),
            Err(errors) => problems.push(format!("{label}: {errors}")),
        }
    }

    let mut seen = HashSet::new();
    for product in &valid {
        if !seen.insert(product.name.to_lowercase()) {
            problems.push(format!("duplicate product name: {}", product.name));
        }
    }

    if problems.is_empty() {
        Ok(valid)
    } else {
        Err(problems)
    }
}

fn validate_faqs(faqs: Vec<FaqInput>) -> Result<Vec<FaqInput>, Vec<String>> {
    let mut valid = Vec::with_capacity(faqs.len());
    let mut problems = Vec::new();

    for (index, faq) in faqs.into_iter().enumerate() {
        match faq.validate() {
            Ok(faq) => valid.push(faq),
            Err(errors) => problems.push(format!("faq #{}: {errors}", index + 1)),
        }
    }

    if problems.is_empty() {
        Ok(valid)
    } else {
        Err(problems)
    }
}

fn report(problems: &[String]) -> CommandError {
    error!("Seed file validation failed:");
    for problem in problems {
        error!("  - {problem}");
    }
    CommandError::Invalid(format!("{} validation errors found", problems.len()))
}

/// Upsert products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any product is
/// invalid, or a database write fails.
pub async fn catalog(file_path: &Path) -> Result<(), CommandError> {
    info!(path = %file_path.display(), "Loading catalog");
    let content = tokio::fs::read_to_string(file_path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;
    let products = validate_products(file.products).map_err(|p| report(&p))?;

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);
    for product in &products {
        let saved = repo.upsert_by_name(product).await?;
        info!(product_id = %saved.id, name = %saved.name, "Product saved");
    }

    info!(count = products.len(), "Catalog seeding complete");
    Ok(())
}

/// Insert FAQs from a YAML file, skipping questions that already exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or a database write fails.
pub async fn faqs(file_path: &Path) -> Result<(), CommandError> {
    info!(path = %file_path.display(), "Loading FAQs");
    let content = tokio::fs::read_to_string(file_path).await?;
    let file: FaqFile = serde_yaml::from_str(&content)?;
    let faqs = validate_faqs(file.faqs).map_err(|p| report(&p))?;

    let pool = connect().await?;
    let repo = FaqRepository::new(&pool);
    let existing: HashSet<String> = repo
        .list_all()
        .await?
        .into_iter()
        .map(|f| f.question.to_lowercase())
        .collect();

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;
    for faq in &faqs {
        if existing.contains(&faq.question.to_lowercase()) {
            skipped += 1;
            continue;
        }
        repo.create(faq).await?;
        inserted += 1;
    }

    info!(inserted, skipped, "FAQ seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_file_parses_and_validates() {
        let file: CatalogFile = serde_yaml::from_str(
            r#"
products:
  - name: "  Voltio Urban S "
    category: scooters
    price: "18999.00"
    stock: 12
    autonomy_km: 45
  - name: Voltio Trail
    category: bicicletas
    price: "32500"
    autonomy_km: 80
    featured: true
"#,
        )
        .unwrap();

        let products = validate_products(file.products).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Voltio Urban S");
        assert!(products[1].featured);
        assert!(products[1].active);
    }

    #[test]
    fn test_catalog_reports_every_problem() {
        let file: CatalogFile = serde_yaml::from_str(
            r#"
products:
  - name: Uno
    category: autos
    price: "-1"
  - name: uno
    category: autos
    price: "100"
  - name: Uno
    category: motos
    price: "200"
"#,
        )
        .unwrap();

        let problems = validate_products(file.products).unwrap_err();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("product #1"));
        assert!(problems[1].contains("duplicate"));
    }

    #[test]
    fn test_faq_file() {
        let file: FaqFile = serde_yaml::from_str(
            r"
faqs:
  - question: ¿Hacen envíos?
    answer: Sí, a todo México.
    category: Envios
  - question: ' '
    answer: vacía
",
        )
        .unwrap();

        let problems = validate_faqs(file.faqs).unwrap_err();
        assert_eq!(problems, vec!["faq #2: question: this field is required".to_owned()]);
    }
}
