//! Conversions: text rendering, formatting, and numeric casts.

use std::fmt::Write;

use crate::names::Name;
use crate::object::{FunctionObj, ObjRef, StrObj, TypeTag};
use crate::stack::ensure_sufficient_stack;
use crate::string::str_text;
use crate::{RtResult, Runtime, RuntimeError};

/// Float rendering: six decimals, lowercase `inf`/`nan`.
fn float_text(value: f64) -> String {
    if value.is_nan() {
        "nan".to_owned()
    } else {
        format!("{value:.6}")
    }
}

fn bytes_text(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() + 3);
    out.push_str("b'");
    for &byte in data {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push('\'');
    out
}

/// Parse a `.Nf` precision spec.
fn float_precision(spec: &str) -> Option<usize> {
    spec.strip_prefix('.')?.strip_suffix('f')?.parse().ok()
}

impl Runtime {
    /// Text of `obj` as `str()` would render it.
    pub fn to_string(&mut self, obj: ObjRef) -> RtResult<ObjRef> {
        if obj.tag() == TypeTag::Str {
            return Ok(self.incref(obj));
        }
        let text = self.to_text(obj, false)?;
        self.alloc_str(&text)
    }

    /// Rendering of `obj`; `nested` quotes strings, as inside a container.
    pub(crate) fn to_text(&mut self, obj: ObjRef, nested: bool) -> RtResult<String> {
        ensure_sufficient_stack(|| self.render(obj, nested))
    }

    fn render(&mut self, obj: ObjRef, nested: bool) -> RtResult<String> {
        match obj.tag() {
            TypeTag::Int => Ok(match self.bool_value(obj) {
                Some(true) => "True".to_owned(),
                Some(false) => "False".to_owned(),
                None => self.int_value(obj).unwrap_or_default().to_string(),
            }),
            TypeTag::Float => Ok(float_text(self.float_value(obj).unwrap_or_default())),
            TypeTag::Str => {
                let text = self.to_c_string(obj)?;
                Ok(if nested {
                    format!("\"{text}\"")
                } else {
                    text.into_owned()
                })
            }
            TypeTag::Bytes => Ok(bytes_text(self.bytes_data(obj)?)),
            TypeTag::Tuple => {
                let items = self.tuple_items(obj)?.to_vec();
                let mut text = self.join_texts(&items, "(", ")")?;
                if items.len() == 1 {
                    text.insert(text.len() - 1, ',');
                }
                Ok(text)
            }
            TypeTag::List => {
                let items = self.list_items(obj)?.to_vec();
                self.join_texts(&items, "[", "]")
            }
            TypeTag::Set => {
                let items = self.set_items(obj)?;
                if items.is_empty() {
                    return Ok("set()".to_owned());
                }
                self.join_texts(&items, "{", "}")
            }
            TypeTag::Dict => {
                let mut out = String::from("{");
                for (i, (key, value)) in self.dict_items(obj)?.into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.to_text(key, true)?);
                    out.push_str(": ");
                    out.push_str(&self.to_text(value, true)?);
                }
                out.push('}');
                Ok(out)
            }
            TypeTag::Instance => match self.call_hook(obj, Name::Str, &[])? {
                Some(result) => {
                    let text = match result.downcast::<StrObj>() {
                        // SAFETY: downcast checked the tag.
                        Some(s) => Ok(unsafe { str_text(s) }.into_owned()),
                        None => Err(RuntimeError::type_error(format!(
                            "__str__ returned non-string (type {})",
                            self.type_name(result)
                        ))),
                    };
                    self.decref(result);
                    text
                }
                None => Ok(format!("<{} at {:#x}>", self.type_name(obj), obj.addr())),
            },
            TypeTag::Function => {
                let ptr = self.expect::<FunctionObj>(obj, "function")?;
                // SAFETY: tag checked.
                let name = unsafe { (*ptr.as_ptr()).name };
                let name = self.symbols.resolve(name).unwrap_or("<unknown>");
                Ok(format!("<function {name}>"))
            }
            TypeTag::Base => Ok(format!("<{} at {:#x}>", self.type_name(obj), obj.addr())),
        }
    }

    fn join_texts(&mut self, items: &[ObjRef], open: &str, close: &str) -> RtResult<String> {
        let mut out = String::from(open);
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.to_text(item, true)?);
        }
        out.push_str(close);
        Ok(out)
    }

    /// Rendering that never fails, for diagnostics. Strings are unquoted.
    pub(crate) fn display_text(&mut self, obj: ObjRef) -> String {
        self.to_text(obj, false)
            .unwrap_or_else(|_| format!("<{} at {:#x}>", obj.tag().name(), obj.addr()))
    }

    /// Like [`display_text`](Self::display_text) but quoting strings.
    pub(crate) fn repr_text(&mut self, obj: ObjRef) -> String {
        self.to_text(obj, true)
            .unwrap_or_else(|_| format!("<{} at {:#x}>", obj.tag().name(), obj.addr()))
    }

    /// Concatenation of the text of each part, as an f-string builds it.
    pub fn joined_str(&mut self, parts: &[ObjRef]) -> RtResult<ObjRef> {
        let mut out = String::new();
        for &part in parts {
            out.push_str(&self.to_text(part, false)?);
        }
        self.alloc_str(&out)
    }

    /// `format(value, spec)`. A `.Nf` spec fixes the decimals of a number;
    /// any other spec renders the value as text.
    pub fn format_value(&mut self, value: ObjRef, spec: &str) -> RtResult<ObjRef> {
        if let (Some(precision), Some(number)) = (float_precision(spec), super::num(value)) {
            return self.alloc_str(&format!("{:.precision$}", number.as_f64()));
        }
        self.to_string(value)
    }

    // ── Casts ───────────────────────────────────────────────────────────

    /// `int(obj)`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "float to int truncates toward zero after the range check"
    )]
    pub fn cast_to_int(&mut self, obj: ObjRef) -> RtResult<ObjRef> {
        match obj.tag() {
            TypeTag::Int => {
                if self.is_bool(obj) {
                    let value = self.int_value(obj).unwrap_or_default();
                    return self.alloc_int(value);
                }
                Ok(self.incref(obj))
            }
            TypeTag::Float => {
                let value = self.float_value(obj).unwrap_or_default();
                if value.is_nan() {
                    return Err(RuntimeError::value_error("cannot convert float NaN to integer"));
                }
                let truncated = value.trunc();
                if !(i64::MIN as f64..i64::MAX as f64).contains(&truncated) {
                    return Err(RuntimeError::Overflow {
                        message: format!("cannot convert float {} to integer", float_text(value)),
                    });
                }
                self.alloc_int(truncated as i64)
            }
            TypeTag::Str => {
                let text = self.to_c_string(obj)?.into_owned();
                match text.trim().parse::<i64>() {
                    Ok(value) => self.alloc_int(value),
                    Err(_) => Err(RuntimeError::value_error(format!(
                        "invalid literal for int() with base 10: '{text}'"
                    ))),
                }
            }
            TypeTag::Instance => {
                let result = self.call_hook(obj, Name::Int, &[])?;
                self.cast_result(obj, result, "int", |rt, result| {
                    rt.int_value(result).is_some() && !rt.is_bool(result)
                })
            }
            _ => Err(self.cast_type_error(obj, "int")),
        }
    }

    /// `float(obj)`.
    pub fn cast_to_float(&mut self, obj: ObjRef) -> RtResult<ObjRef> {
        match obj.tag() {
            TypeTag::Float => Ok(self.incref(obj)),
            TypeTag::Int => {
                let value = super::num(obj).map_or(0.0, super::Num::as_f64);
                self.alloc_float(value)
            }
            TypeTag::Str => {
                let text = self.to_c_string(obj)?.into_owned();
                match text.trim().parse::<f64>() {
                    Ok(value) => self.alloc_float(value),
                    Err(_) => Err(RuntimeError::value_error(format!(
                        "could not convert string to float: '{text}'"
                    ))),
                }
            }
            TypeTag::Instance => {
                let result = self.call_hook(obj, Name::Float, &[])?;
                self.cast_result(obj, result, "float", |_, result| result.tag() == TypeTag::Float)
            }
            _ => Err(self.cast_type_error(obj, "float")),
        }
    }

    /// Check the result of an `__int__`/`__float__` hook.
    fn cast_result(
        &mut self,
        obj: ObjRef,
        result: Option<ObjRef>,
        target: &str,
        accept: impl FnOnce(&Runtime, ObjRef) -> bool,
    ) -> RtResult<ObjRef> {
        let Some(result) = result else {
            return Err(self.cast_type_error(obj, target));
        };
        if accept(&*self, result) {
            return Ok(result);
        }
        let err = RuntimeError::type_error(format!(
            "__{target}__ returned non-{target} (type {})",
            self.type_name(result)
        ));
        self.decref(result);
        Err(err)
    }

    fn cast_type_error(&mut self, obj: ObjRef, target: &str) -> RuntimeError {
        RuntimeError::type_error(format!(
            "{target}() argument must be a string or a number, not '{}'",
            self.type_name(obj)
        ))
    }
}
