use crate::model::{City, PointOfInterest};
use crate::store::traits::CityInfoStore;
use anyhow::Result;

/// Helper function to create a seed point of interest
fn point(name: &str, description: &str) -> PointOfInterest {
    PointOfInterest::new(name.to_string(), Some(description.to_string()))
}

fn sample_cities() -> Vec<City> {
    vec![
        City::new(
            "Buenos Aires".to_string(),
            Some("The Paris of South America".to_string()),
        )
        .with_points(vec![
            point("Obelisco", "Big Obelisk in the city center"),
            point("Pink House", "The government house"),
        ]),
        City::new(
            "Resistencia".to_string(),
            Some("The City of Sculptures".to_string()),
        )
        .with_points(vec![
            point("Cathedral", "A modern style cathedral"),
            point("Democracy Park", "Green space perfect for open activities"),
        ]),
        City::new(
            "Corrientes".to_string(),
            Some("The City with 'Paje'".to_string()),
        )
        .with_points(vec![point("Costanera", "A space near the river")]),
    ]
}

/// Insert the sample cities unless the store already has data.
/// Returns the number of cities inserted.
pub async fn ensure_seed_data<S: CityInfoStore>(store: &S) -> Result<usize> {
    if !store.get_cities().await?.is_empty() {
        return Ok(0);
    }

    let cities = sample_cities();
    let count = cities.len();
    for city in cities {
        store.insert_city(city).await?;
    }

    Ok(count)
}
