//! Node kinds produced by the `tree-sitter-elm` grammar.
//!
//! Only the kinds the resolvers look at are listed here. Keywords that the
//! grammar exposes as named nodes (`module`, `import`, `type`, `alias`, ...)
//! are listed alongside the structural kinds because several rules inspect
//! the previous named sibling of a name.

pub const FILE: &str = "file";
pub const ERROR: &str = "ERROR";

pub const MODULE_DECLARATION: &str = "module_declaration";
pub const MODULE: &str = "module";
pub const IMPORT_CLAUSE: &str = "import_clause";
pub const IMPORT: &str = "import";
pub const AS_CLAUSE: &str = "as_clause";

pub const EXPOSING_LIST: &str = "exposing_list";
pub const DOUBLE_DOT: &str = "double_dot";
pub const EXPOSED_VALUE: &str = "exposed_value";
pub const EXPOSED_TYPE: &str = "exposed_type";
pub const EXPOSED_OPERATOR: &str = "exposed_operator";
pub const EXPOSED_UNION_CONSTRUCTORS: &str = "exposed_union_constructors";
pub const EXPOSED_UNION_CONSTRUCTOR: &str = "exposed_union_constructor";

pub const UPPER_CASE_QID: &str = "upper_case_qid";
pub const VALUE_QID: &str = "value_qid";
pub const UPPER_CASE_IDENTIFIER: &str = "upper_case_identifier";
pub const LOWER_CASE_IDENTIFIER: &str = "lower_case_identifier";
pub const DOT: &str = "dot";

pub const VALUE_DECLARATION: &str = "value_declaration";
pub const FUNCTION_DECLARATION_LEFT: &str = "function_declaration_left";
pub const TYPE_ANNOTATION: &str = "type_annotation";
pub const PORT_ANNOTATION: &str = "port_annotation";
pub const TYPE_EXPRESSION: &str = "type_expression";
pub const TYPE_REF: &str = "type_ref";
pub const RECORD_TYPE: &str = "record_type";
pub const FIELD_TYPE: &str = "field_type";
pub const ARROW: &str = "arrow";

pub const TYPE_DECLARATION: &str = "type_declaration";
pub const TYPE: &str = "type";
pub const TYPE_ALIAS_DECLARATION: &str = "type_alias_declaration";
pub const ALIAS: &str = "alias";
pub const UNION_VARIANT: &str = "union_variant";

pub const INFIX_DECLARATION: &str = "infix_declaration";
pub const OPERATOR_IDENTIFIER: &str = "operator_identifier";
pub const VALUE_EXPR: &str = "value_expr";

pub const LET_IN_EXPR: &str = "let_in_expr";
pub const CASE_OF_BRANCH: &str = "case_of_branch";
pub const ANONYMOUS_FUNCTION_EXPR: &str = "anonymous_function_expr";
pub const PATTERN: &str = "pattern";
pub const LOWER_PATTERN: &str = "lower_pattern";
pub const RECORD_BASE_IDENTIFIER: &str = "record_base_identifier";
pub const RECORD_EXPR: &str = "record_expr";
pub const FIELD: &str = "field";
pub const FIELD_ACCESS_EXPR: &str = "field_access_expr";

pub const BLOCK_COMMENT: &str = "block_comment";
pub const LINE_COMMENT: &str = "line_comment";
