use crate::model::NavigationItem;
use serde::{Deserialize, Serialize};

/// One entry of the route index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Route {
    pub slug: String,
    pub path: String,
}

/// All page routes, sorted by path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteIndex {
    pub routes: Vec<Route>,
    pub total: usize,
}

impl RouteIndex {
    /// Builds a sorted index, dropping duplicate slugs
    pub fn new(mut routes: Vec<Route>) -> Self {
        routes.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.slug.cmp(&b.slug)));
        routes.dedup_by(|a, b| a.slug == b.slug);
        let total = routes.len();
        Self { routes, total }
    }
}

/// Site-wide navigation menu
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationIndex {
    pub items: Vec<NavigationItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(slug: &str, path: &str) -> Route {
        Route {
            slug: slug.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_route_index_sorted_by_path() {
        let index = RouteIndex::new(vec![
            route("services", "/services"),
            route("home", "/"),
            route("about", "/about"),
        ]);

        let paths: Vec<_> = index.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/about", "/services"]);
        assert_eq!(index.total, 3);
    }

    #[test]
    fn test_route_index_drops_duplicates() {
        let index = RouteIndex::new(vec![route("about", "/about"), route("about", "/about")]);
        assert_eq!(index.total, 1);
    }
}
