use crate::error::TransformError;
use crate::services::transform::ScalarTransform;

fn latin_for(ch: char) -> Option<&'static str> {
    let s = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "c",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shh",
        'ъ' => "\"",
        'ы' => "y",
        'ь' => "'",
        'э' => "e'",
        'ю' => "yu",
        'я' => "ya",
        'А' => "A",
        'Б' => "B",
        'В' => "V",
        'Г' => "G",
        'Д' => "D",
        'Е' => "E",
        'Ё' => "Yo",
        'Ж' => "Zh",
        'З' => "Z",
        'И' => "I",
        'Й' => "J",
        'К' => "K",
        'Л' => "L",
        'М' => "M",
        'Н' => "N",
        'О' => "O",
        'П' => "P",
        'Р' => "R",
        'С' => "S",
        'Т' => "T",
        'У' => "U",
        'Ф' => "F",
        'Х' => "H",
        'Ц' => "C",
        'Ч' => "Ch",
        'Ш' => "Sh",
        'Щ' => "Shh",
        'Ъ' => "\"",
        'Ы' => "Y",
        'Ь' => "'",
        'Э' => "E'",
        'Ю' => "Yu",
        'Я' => "Ya",
        _ => return None,
    };
    Some(s)
}

/// Russian Cyrillic to Latin. Anything else is copied as is.
pub fn translit(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match latin_for(ch) {
            Some(latin) => out.push_str(latin),
            None => out.push(ch),
        }
    }
    out
}

/// Local transliteration adapter. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Transliterator;

impl ScalarTransform for Transliterator {
    fn transform(&mut self, text: &str) -> Result<String, TransformError> {
        Ok(translit(text))
    }
}
