use std::collections::BTreeMap;

use itertools::Itertools as _;
use tracing::debug;
use utoipa::OpenApi;
use utoipa::openapi::HttpMethod;
use utoipa::openapi::ObjectBuilder;
use utoipa::openapi::PathItem;
use utoipa::openapi::RefOr;
use utoipa::openapi::Schema;
use utoipa::openapi::path::Operation;
use utoipa::openapi::path::PathItemBuilder;
use utoipa::openapi::schema::SchemaType;
use utoipa::openapi::schema::Type;

use crate::error::ErrorDefinition;
use crate::views::router::FlattenedPath;
use crate::views::service_router;

fn concat_path<A: AsRef<str>, B: AsRef<str>>(a: A, b: B) -> String {
    let (a, b) = (a.as_ref(), b.as_ref());
    match (a.ends_with('/'), b.strip_prefix('/')) {
        (true, Some(b)) => format!("{a}{b}"),
        _ => format!("{a}{b}"),
    }
}

fn path_item_operations(path_item: PathItem) -> BTreeMap<HttpMethod, Operation> {
    let mut operations = BTreeMap::new();
    operations.extend(path_item.get.map(|op| (HttpMethod::Get, op)));
    operations.extend(path_item.put.map(|op| (HttpMethod::Put, op)));
    operations.extend(path_item.post.map(|op| (HttpMethod::Post, op)));
    operations.extend(path_item.delete.map(|op| (HttpMethod::Delete, op)));
    operations
}

fn path_item_operations_mut(path_item: &mut PathItem) -> Vec<&mut Operation> {
    let mut operations = Vec::new();
    operations.extend(path_item.get.as_mut());
    operations.extend(path_item.put.as_mut());
    operations.extend(path_item.post.as_mut());
    operations.extend(path_item.delete.as_mut());
    operations
}

/// Two routes of the same path with different methods end up in one path item
fn merge_path_items(mut a: PathItem, b: PathItem) -> PathItem {
    a.merge_operations(b.clone());
    let operations = path_item_operations(a.clone());
    let mut builder = PathItemBuilder::new()
        .summary(a.summary.or(b.summary))
        .description(a.description.or(b.description))
        .parameters(match (a.parameters, b.parameters) {
            (Some(a), Some(b)) => Some(a.into_iter().chain(b).collect()),
            (Some(p), None) | (None, Some(p)) => Some(p),
            (None, None) => None,
        });
    for (method, operation) in operations {
        builder = builder.operation(method, operation);
    }
    builder.build()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Noteblog",
        description = "Notes and the blog posts generated from them",
        license(name = "LGPL", url = "https://www.gnu.org/licenses/lgpl-3.0.html"),
    ),
    components(schemas(crate::error::InternalError))
)]
pub struct OpenApiRoot;

impl OpenApiRoot {
    fn error_context_to_openapi_object(error_def: &ErrorDefinition) -> utoipa::openapi::Object {
        let mut context = utoipa::openapi::Object::new();
        let properties = error_def.get_context();
        // sorted to keep the generated file stable
        for (prop_name, prop_type) in properties.iter().sorted() {
            let utoipa_type = match prop_type.as_str() {
                "bool" => Type::Boolean,
                "isize" | "i8" | "i16" | "i32" | "i64" | "usize" | "u8" | "u16" | "u32" | "u64" => {
                    Type::Integer
                }
                "f32" | "f64" => Type::Number,
                "Vec" => Type::Array,
                "char" | "String" | "str" | "DateTime" => Type::String,
                _ => Type::Object,
            };
            context.properties.insert(
                prop_name.clone(),
                ObjectBuilder::new()
                    .schema_type(SchemaType::Type(utoipa_type))
                    .into(),
            );
            context.required.push(prop_name.clone());
        }
        context
    }

    fn add_errors_in_schema(openapi: &mut utoipa::openapi::OpenApi) {
        let mut noteblog_error = utoipa::openapi::OneOf::new();
        noteblog_error.description = Some("Generated error type for Noteblog".to_string());
        noteblog_error.discriminator = Some(utoipa::openapi::Discriminator::new("type"));

        // inventory gives no order guarantee
        let errors = inventory::iter::<ErrorDefinition>
            .into_iter()
            .sorted_by(|a, b| a.namespace.cmp(b.namespace).then(a.id.cmp(b.id)))
            .collect::<Vec<_>>();
        let schemas = &mut openapi.components.get_or_insert_with(Default::default).schemas;
        for error_def in errors {
            schemas.insert(
                error_def.get_schema_name(),
                ObjectBuilder::new()
                    .property(
                        "type",
                        ObjectBuilder::new()
                            .schema_type(SchemaType::Type(Type::String))
                            .enum_values(Some([error_def.id])),
                    )
                    .property(
                        "status",
                        ObjectBuilder::new()
                            .schema_type(SchemaType::Type(Type::Integer))
                            .enum_values(Some([error_def.status])),
                    )
                    .property(
                        "message",
                        ObjectBuilder::new().schema_type(SchemaType::Type(Type::String)),
                    )
                    .property("context", Self::error_context_to_openapi_object(error_def))
                    .required("type")
                    .required("status")
                    .required("message")
                    .into(),
            );
            noteblog_error.items.push(
                utoipa::openapi::Ref::new(format!(
                    "#/components/schemas/{}",
                    error_def.get_schema_name()
                ))
                .into(),
            );
        }

        schemas.insert(
            String::from("NoteblogError"),
            utoipa::openapi::OneOfBuilder::from(noteblog_error).into(),
        );
    }

    fn insert_routes(openapi: &mut utoipa::openapi::OpenApi) -> Vec<(String, RefOr<Schema>)> {
        let flattened_paths = service_router()
            .path_trees
            .into_iter()
            .flat_map(|t| t.flatten());
        let mut all_schemas = Vec::new();
        for FlattenedPath {
            path_segments,
            path_item,
            schemas,
        } in flattened_paths
        {
            let path = path_segments
                .into_iter()
                .map(String::from)
                .fold(String::new(), concat_path);
            // axum nests need a "/" route, the OpenAPI paths don't have trailing slashes
            let path = match path.trim_end_matches('/') {
                "" => String::from("/"),
                trimmed => trimmed.to_owned(),
            };
            debug!("processing {path}");
            let path_item = match openapi.paths.paths.remove(&path) {
                Some(existing) => merge_path_items(existing, path_item),
                None => path_item,
            };
            openapi.paths.paths.insert(path, path_item);
            all_schemas.extend(schemas);
        }
        all_schemas
    }

    fn insert_schemas(
        openapi: &mut utoipa::openapi::OpenApi,
        routes_schemas: Vec<(String, RefOr<Schema>)>,
    ) {
        let schemas = &mut openapi.components.get_or_insert_with(Default::default).schemas;
        for (name, schema) in routes_schemas {
            schemas.entry(name).or_insert(schema);
        }
    }

    // The operation ids default to the handler names, which are not unique
    fn remove_operation_id(openapi: &mut utoipa::openapi::OpenApi) {
        for (_, endpoint) in openapi.paths.paths.iter_mut() {
            for operation in path_item_operations_mut(endpoint) {
                operation.operation_id = None;
            }
        }
    }

    pub fn build_openapi() -> utoipa::openapi::OpenApi {
        let mut openapi = OpenApiRoot::openapi();
        let routes_schemas = Self::insert_routes(&mut openapi);
        Self::insert_schemas(&mut openapi, routes_schemas);
        Self::add_errors_in_schema(&mut openapi);
        Self::remove_operation_id(&mut openapi);
        openapi
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn openapi_building_goes_well() {
        let _ = OpenApiRoot::build_openapi(); // panics if something is wrong
    }

    #[rstest]
    #[case::root("/", "/api", "/api")]
    #[case::double_slash("/api/", "/notes", "/api/notes")]
    #[case::no_slash("/api", "notes", "/apinotes")]
    fn paths_are_concatenated(#[case] a: &str, #[case] b: &str, #[case] expected: &str) {
        assert_eq!(concat_path(a, b), expected);
    }

    #[test]
    fn every_route_is_documented() {
        let openapi = OpenApiRoot::build_openapi();
        let paths = openapi.paths.paths.keys().cloned().collect::<Vec<_>>();
        for expected in [
            "/health",
            "/version",
            "/api/notes",
            "/api/notes/generate-blog",
            "/api/notes/{note_id}",
            "/api/blogposts",
            "/api/blogposts/generate",
            "/api/blogposts/{blog_post_id}",
        ] {
            assert!(paths.contains(&expected.to_owned()), "missing {expected}");
        }
        let notes = &openapi.paths.paths["/api/notes/{note_id}"];
        assert!(notes.get.is_some());
        assert!(notes.put.is_some());
        assert!(notes.delete.is_some());
    }

    #[test]
    fn errors_are_documented() {
        let openapi = OpenApiRoot::build_openapi();
        let schemas = &openapi.components.expect("components are built").schemas;
        assert!(schemas.contains_key("NoteblogError"));
        assert!(schemas.contains_key("NoteblogNoteErrorNotFound"));
        assert!(schemas.contains_key("NoteblogCompletionErrorUpstreamStatus"));
    }
}
