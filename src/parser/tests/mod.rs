mod tests_lexer;
mod tests_parser;
