//! Guessing the language of untagged code blocks.

use super::syntax_set;

/// Weighted markers per language. The highest total wins when it reaches
/// [`MIN_SCORE`]; ties go to the earlier entry.
const SIGNATURES: &[(&str, &[(&str, u32)])] = &[
    (
        "rust",
        &[
            ("fn main", 3),
            ("let mut ", 3),
            ("pub fn ", 3),
            ("impl ", 2),
            ("use std", 3),
            ("println!", 3),
            ("#[derive", 3),
            ("fn ", 1),
            ("::", 1),
            ("-> ", 1),
        ],
    ),
    (
        "python",
        &[
            ("def ", 2),
            ("elif ", 3),
            ("__init__", 3),
            ("self.", 2),
            ("print(", 2),
            ("import ", 1),
            ("):\n", 2),
            ("None", 1),
        ],
    ),
    (
        "typescript",
        &[
            ("interface ", 2),
            (": string", 3),
            (": number", 3),
            ("export type", 3),
        ],
    ),
    (
        "javascript",
        &[
            ("function ", 2),
            ("console.log", 3),
            ("require(", 2),
            ("document.", 2),
            ("=> ", 1),
            ("const ", 1),
            ("let ", 1),
        ],
    ),
    (
        "go",
        &[("package ", 2), ("func ", 3), (":= ", 2), ("fmt.", 3)],
    ),
    (
        "cpp",
        &[
            ("std::", 3),
            ("#include <iostream>", 3),
            ("cout", 2),
            ("template<", 3),
        ],
    ),
    (
        "c",
        &[("#include", 3), ("printf(", 2), ("int main", 2), ("malloc(", 2)],
    ),
    (
        "java",
        &[
            ("public class", 3),
            ("System.out", 3),
            ("public static void", 3),
            ("import java", 3),
        ],
    ),
    (
        "ruby",
        &[
            ("puts ", 2),
            (".each do", 3),
            ("require '", 2),
            ("attr_accessor", 3),
            ("end\n", 1),
        ],
    ),
    ("php", &[("<?php", 5), ("$this->", 3), ("echo ", 1)]),
    (
        "bash",
        &[
            ("#!/bin/bash", 5),
            ("#!/bin/sh", 5),
            ("fi\n", 2),
            ("then\n", 2),
            ("esac", 3),
            ("echo ", 1),
            ("$(", 1),
        ],
    ),
    (
        "sql",
        &[
            ("SELECT ", 3),
            ("INSERT INTO", 3),
            ("CREATE TABLE", 3),
            ("FROM ", 2),
            ("WHERE ", 2),
        ],
    ),
    (
        "html",
        &[("<!DOCTYPE", 5), ("<html", 4), ("<div", 3), ("</", 1)],
    ),
    ("css", &[("px;", 3), ("color:", 2), ("margin", 1), ("{\n", 1)]),
    ("yaml", &[("---\n", 1), ("- name:", 3), ("version:", 1)]),
];

const MIN_SCORE: u32 = 3;

/// Guess the language of an untagged code block.
///
/// Shebangs and other first-line markers go through syntect; otherwise the
/// block is scored against keyword signatures.
pub fn detect_language(code: &str) -> Option<String> {
    let trimmed = code.trim_start();
    let first_line = trimmed.lines().next()?;

    if let Some(syntax) = syntax_set().find_syntax_by_first_line(first_line) {
        if let Some(token) = token_for_syntax(&syntax.name, &syntax.file_extensions) {
            return Some(token);
        }
    }

    if looks_like_json(trimmed) {
        return Some("json".to_string());
    }

    let mut best: Option<(&str, u32)> = None;
    for (language, markers) in SIGNATURES {
        let score: u32 = markers
            .iter()
            .filter(|(marker, _)| trimmed.contains(marker))
            .map(|(_, weight)| weight)
            .sum();
        if score >= MIN_SCORE && best.is_none_or(|(_, top)| score > top) {
            best = Some((language, score));
        }
    }
    best.map(|(language, _)| language.to_string())
}

fn token_for_syntax(name: &str, extensions: &[String]) -> Option<String> {
    let token = match name {
        "Plain Text" => return None,
        "Python" => "python",
        "Bourne Again Shell (bash)" => "bash",
        "PHP" => "php",
        "Ruby" => "ruby",
        "Perl" => "perl",
        "XML" => "xml",
        "JavaScript" => "javascript",
        _ => return extensions.first().cloned(),
    };
    Some(token.to_string())
}

fn looks_like_json(trimmed: &str) -> bool {
    let body = trimmed.trim_end();
    let object = body.starts_with('{') && body.ends_with('}');
    let array = body.starts_with('[') && body.ends_with(']');
    (object && body.contains("\":")) || (array && body.contains('"') && !body.contains(';'))
}
