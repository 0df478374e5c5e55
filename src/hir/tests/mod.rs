mod tests_extract;
