use std::collections::HashMap;

/// the functional unit of road information: one link described as a
/// combination of named attributes, including the distance column the
/// trained model expects. links compose into [`super::Route`]s, or feed the
/// prediction methods directly through a route of one.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub attributes: HashMap<String, f64>,
}

impl Link {
    pub fn new(attributes: HashMap<String, f64>) -> Link {
        Link { attributes }
    }

    pub fn get(&self, attribute: &str) -> Option<f64> {
        self.attributes.get(attribute).copied()
    }
}
