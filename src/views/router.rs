use std::collections::VecDeque;

use utoipa::openapi::HttpMethod;
use utoipa::openapi::RefOr;
use utoipa::openapi::path::Operation;
use utoipa::openapi::path::PathItem;
use utoipa::openapi::schema::Schema;

/// What `#[noteblog_derive::route]` collects about a handler
pub(crate) struct RouteDocumentation {
    pub(crate) http_methods: Vec<HttpMethod>,
    pub(crate) operation: Operation,
    pub(crate) tags: Vec<&'static str>,
    pub(crate) schemas: Vec<(String, RefOr<Schema>)>,
}

// fn(handler_type_name) -> documentation of the handler
//
// std::any::type_name_of_val isn't const, so the handlers are matched by name at runtime.
pub(crate) type OpenApiRouteSliceItem = fn(&str) -> Option<fn() -> RouteDocumentation>;

#[linkme::distributed_slice]
pub(crate) static OPENAPI_ROUTES: [OpenApiRouteSliceItem];

/// An axum router which keeps track of the documentation of each of its routes
#[derive(Default)]
pub(super) struct DocumentedRouter {
    pub(super) router: axum::Router<super::AppState>,
    pub(super) path_trees: Vec<PathTree>,
}

pub(super) enum PathTree {
    Leaf {
        path_segment: &'static str,
        path_item: fn() -> RouteDocumentation,
    },
    Branch {
        path_segment: &'static str,
        sub_paths: Vec<PathTree>,
    },
}

pub(super) struct FlattenedPath {
    pub(super) path_segments: VecDeque<&'static str>,
    pub(super) path_item: PathItem,
    pub(super) schemas: Vec<(String, RefOr<Schema>)>,
}

impl PathTree {
    pub(super) fn flatten(self) -> Vec<FlattenedPath> {
        match self {
            PathTree::Leaf {
                path_segment,
                path_item,
            } => {
                let RouteDocumentation {
                    http_methods,
                    mut operation,
                    tags,
                    schemas,
                } = path_item();
                // utoipa 5 hands the tags over separately when not using the OpenApi derive
                if !tags.is_empty() {
                    operation.tags = Some(tags.iter().map(|s| s.to_string()).collect());
                }
                vec![FlattenedPath {
                    path_segments: VecDeque::from([path_segment]),
                    path_item: PathItem::from_http_methods(http_methods, operation),
                    schemas,
                }]
            }
            PathTree::Branch {
                path_segment,
                sub_paths,
            } => sub_paths
                .into_iter()
                .flat_map(PathTree::flatten)
                .map(|mut flattened| {
                    flattened.path_segments.push_front(path_segment);
                    flattened
                })
                .collect(),
        }
    }
}

impl DocumentedRouter {
    pub(super) fn root(f: impl FnOnce(Self) -> Self) -> Self {
        f(Self::default())
    }

    #[track_caller] // panics at the faulty line of the router definition
    pub(super) fn route(
        mut self,
        path: &'static str,
        (type_name, method_router, expected_method): (
            &str,
            axum::routing::MethodRouter<super::AppState>,
            HttpMethod,
        ),
    ) -> Self {
        let Some(path_item) = OPENAPI_ROUTES.iter().find_map(|matcher| matcher(type_name)) else {
            panic!("no openapi found for route {path} with type {type_name}!");
        };
        let RouteDocumentation { http_methods, .. } = path_item();
        if !http_methods.contains(&expected_method) {
            // HttpMethod implements neither Debug nor Display
            panic!(
                "expected method {} in the router at \"{path}\" but found {} in utoipa path",
                serde_json::to_string(&expected_method).unwrap_or_default(),
                serde_json::to_string(&http_methods).unwrap_or_default()
            );
        }
        self.path_trees.push(PathTree::Leaf {
            path_segment: path,
            path_item,
        });
        Self {
            router: self.router.route(path, method_router),
            path_trees: self.path_trees,
        }
    }

    pub(super) fn nests(mut self, path: &'static str, f: impl FnOnce(Self) -> Self) -> Self {
        let Self { router, path_trees } = f(Self::default());
        self.path_trees.push(PathTree::Branch {
            path_segment: path,
            sub_paths: path_trees,
        });
        Self {
            router: self.router.nest(path, router),
            path_trees: self.path_trees,
        }
    }
}

macro_rules! get {
    ($f:path) => {
        (
            std::any::type_name_of_val(&$f),
            axum::routing::get($f),
            utoipa::openapi::HttpMethod::Get,
        )
    };
}

macro_rules! post {
    ($f:path) => {
        (
            std::any::type_name_of_val(&$f),
            axum::routing::post($f),
            utoipa::openapi::HttpMethod::Post,
        )
    };
}

macro_rules! put {
    ($f:path) => {
        (
            std::any::type_name_of_val(&$f),
            axum::routing::put($f),
            utoipa::openapi::HttpMethod::Put,
        )
    };
}

macro_rules! delete {
    ($f:path) => {
        (
            std::any::type_name_of_val(&$f),
            axum::routing::delete($f),
            utoipa::openapi::HttpMethod::Delete,
        )
    };
}

pub(super) use delete;
pub(super) use get;
pub(super) use post;
pub(super) use put;
