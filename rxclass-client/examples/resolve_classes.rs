use rxclass_client::{ClassificationCache, ClassificationResolver};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cache = Arc::new(ClassificationCache::default());
    let resolver = ClassificationResolver::new(cache);

    // metoprolol, atenolol, and a code RxNav does not know
    let rxcuis = vec!["6918".to_string(), "1202".to_string(), "0".to_string()];

    let start = std::time::Instant::now();
    let first = resolver.resolve_many(&rxcuis).await?;
    println!("First resolution took: {:?}", start.elapsed());

    for (rxcui, classification) in rxcuis.iter().zip(&first) {
        match classification {
            Some(classification) => {
                let names: Vec<_> = classification.therapeutic_class_names().collect();
                println!("{} ({:?}): {:?}", rxcui, classification.drug_name(), names);
            }
            None => println!("{}: no classification", rxcui),
        }
    }

    let start = std::time::Instant::now();
    resolver.resolve_many(&rxcuis).await?;
    println!("Cached resolution took: {:?}", start.elapsed());
    println!("Cache stats: {:?}", resolver.cache_stats());

    Ok(())
}
