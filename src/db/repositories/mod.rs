mod occurrences;
mod settings;
