use super::Link;
use crate::model::{LinkPass, LinkTable, ModelError};
use itertools::Itertools;

/// a sequence of links describing a previous or proposed vehicle trip.
/// routes are the natural input to route-level energy prediction.
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub links: Vec<Link>,
}

impl Route {
    pub fn new(links: Vec<Link>) -> Route {
        Route { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// converts the route into prediction input. every link must carry the
    /// distance attribute; the remaining attribute names become the feature
    /// columns.
    pub fn to_link_table(&self, distance: &str) -> Result<LinkTable, ModelError> {
        let feature_names: Vec<String> = self
            .links
            .iter()
            .flat_map(|link| link.attributes.keys())
            .filter(|name| name.as_str() != distance)
            .unique()
            .sorted()
            .cloned()
            .collect();
        let rows = self
            .links
            .iter()
            .enumerate()
            .map(|(idx, link)| {
                let d = link.get(distance).ok_or_else(|| {
                    ModelError::DataError(format!(
                        "route link {idx} is missing the '{distance}' attribute"
                    ))
                })?;
                let features = link
                    .attributes
                    .iter()
                    .filter(|(name, _)| name.as_str() != distance)
                    .map(|(name, value)| (name.clone(), *value))
                    .collect();
                Ok(LinkPass {
                    features,
                    distance: d,
                })
            })
            .collect::<Result<Vec<LinkPass>, ModelError>>()?;
        Ok(LinkTable::new(feature_names, rows))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_route_converts_to_prediction_input() {
        let route = Route::new(vec![
            Link::new(HashMap::from([
                (String::from("speed_mph_float"), 5.0),
                (String::from("miles"), 2.0),
            ])),
            Link::new(HashMap::from([
                (String::from("speed_mph_float"), 15.0),
                (String::from("miles"), 1.0),
            ])),
        ]);
        let table = route
            .to_link_table("miles")
            .expect("test invariant failed: conversion should succeed");
        assert_eq!(table.feature_names, vec![String::from("speed_mph_float")]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].distance, 2.0);
    }

    #[test]
    fn test_route_link_without_distance_is_rejected() {
        let route = Route::new(vec![Link::new(HashMap::from([(
            String::from("speed_mph_float"),
            5.0,
        )]))]);
        assert!(matches!(
            route.to_link_table("miles"),
            Err(ModelError::DataError(_))
        ));
    }
}
