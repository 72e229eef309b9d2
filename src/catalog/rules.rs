use super::Severity;

/// Static description of a catalog rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub kind: &'static str,
    pub pattern: &'static str,
    pub severity: Severity,
    pub analysis: Option<&'static str>,
    pub solution: Option<&'static str>,
    pub code_fix: Option<&'static str>,
}

const fn rule(kind: &'static str, pattern: &'static str, severity: Severity) -> RuleSpec {
    RuleSpec {
        kind,
        pattern,
        severity,
        analysis: None,
        solution: None,
        code_fix: None,
    }
}

/// Built-in rules in precedence order.
pub static DEFAULT_RULES: &[RuleSpec] = &[
    RuleSpec {
        analysis: Some("Syntax error detected in the code. The error message indicates: {message}. This typically means there is a typo, missing punctuation, or incorrect indentation in your code."),
        solution: Some("Check for missing colons, parentheses, or quotes. Verify proper indentation."),
        code_fix: Some("if condition:\n    pass\n\nfor item in items:\n    process(item)"),
        ..rule("SyntaxError", r"SyntaxError:(.+)", Severity::Low)
    },
    RuleSpec {
        analysis: Some("Type mismatch error: {message}. This occurs when an operation is performed on incompatible data types."),
        solution: Some("Ensure all variables are of the expected type. Use type conversion functions if needed."),
        code_fix: Some("value = str(value)\nresult = int(input(\"Enter number: \"))"),
        ..rule("TypeError", r"TypeError:(.+)", Severity::High)
    },
    RuleSpec {
        analysis: Some("Invalid value error: {message}. The function received an argument of the correct type but inappropriate value."),
        solution: Some("Validate input values before processing. Use try-except blocks for error handling."),
        code_fix: Some("try:\n    value = int(user_input)\nexcept ValueError:\n    print(\"Invalid input\")"),
        ..rule("ValueError", r"ValueError:(.+)", Severity::Medium)
    },
    RuleSpec {
        analysis: Some("Attribute access error: {message}. An object does not have the attribute or method being accessed."),
        solution: Some("Check if the object has the attribute. Use hasattr() to verify before accessing."),
        code_fix: Some("if hasattr(obj, \"attribute\"):\n    result = obj.attribute"),
        ..rule("AttributeError", r"AttributeError:(.+)", Severity::High)
    },
    RuleSpec {
        analysis: Some("Name reference error: {message}. A variable or function name is used before being defined."),
        solution: Some("Make sure all variables are defined before use. Check for typos in variable names."),
        code_fix: Some("variable_name = \"value\"\nresult = variable_name"),
        ..rule("NameError", r"NameError:(.+)", Severity::Low)
    },
    RuleSpec {
        analysis: Some("Module import error: {message}. The specified module or package cannot be found or imported."),
        solution: Some("Install the required package using pip. Verify the module name is correct."),
        ..rule("ImportError", r"ImportError:(.+)", Severity::High)
    },
    RuleSpec {
        analysis: Some("Index out of range: {message}. Attempting to access a list/array index that does not exist."),
        solution: Some("Check list bounds before accessing. Use len() to verify index is within range."),
        code_fix: Some("if 0 <= index < len(my_list):\n    item = my_list[index]"),
        ..rule("IndexError", r"IndexError:(.+)", Severity::Medium)
    },
    RuleSpec {
        analysis: Some("Dictionary key error: {message}. Trying to access a dictionary key that does not exist."),
        solution: Some("Use .get() method or check if key exists before accessing dictionary."),
        code_fix: Some("value = my_dict.get(\"key\", default_value)"),
        ..rule("KeyError", r"KeyError:(.+)", Severity::Medium)
    },
    RuleSpec {
        analysis: Some("File not found: {message}. The specified file path does not exist."),
        solution: Some("Verify the file path is correct. Use os.path.exists() to check file existence."),
        code_fix: Some("import os\nif os.path.exists(filepath):\n    with open(filepath) as f:\n        data = f.read()"),
        ..rule("FileNotFoundError", r"FileNotFoundError:(.+)", Severity::Low)
    },
    rule("PermissionError", r"PermissionError:(.+)", Severity::Low),
    rule("RuntimeError", r"RuntimeError:(.+)", Severity::Low),
    rule("MemoryError", r"MemoryError:(.+)", Severity::Critical),
    rule("RecursionError", r"RecursionError:(.+)", Severity::Critical),
    rule("ZeroDivisionError", r"ZeroDivisionError:(.+)", Severity::Low),
    RuleSpec {
        analysis: Some("HTTP 404 Not Found error. The requested resource could not be found on the server."),
        solution: Some("Check the URL is correct. Verify the resource exists on the server."),
        ..rule("404Error", r"(404|Not Found)", Severity::Medium)
    },
    RuleSpec {
        analysis: Some("HTTP 500 Internal Server Error. The server encountered an unexpected condition."),
        solution: Some("Check server logs for details. Review recent code changes."),
        ..rule("500Error", r"(500|Internal Server Error)", Severity::Critical)
    },
    rule("403Error", r"(403|Forbidden)", Severity::Low),
    RuleSpec {
        analysis: Some("Database operation failed: {message}. Check database connection and query syntax."),
        solution: Some("Verify database connection parameters. Check SQL query syntax."),
        code_fix: Some("try:\n    cursor.execute(query)\n    conn.commit()\nexcept Exception as e:\n    conn.rollback()\n    print(f\"Error: {e}\")"),
        ..rule("DatabaseError", r"(database|sql|mysql|postgres).*error", Severity::Critical)
    },
    RuleSpec {
        analysis: Some("Network connection failed: {message}. Check network connectivity and service availability."),
        solution: Some("Check network connectivity. Verify service is running and accessible."),
        ..rule("ConnectionError", r"(connection|network).*error", Severity::High)
    },
    rule("TimeoutError", r"timeout", Severity::Low),
];
