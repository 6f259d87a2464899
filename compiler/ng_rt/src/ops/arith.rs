//! Arithmetic operators.
//!
//! Int with int stays int and fails on overflow; any float operand makes
//! the result a float. Floor division and modulo round toward negative
//! infinity, so a non-zero remainder takes the sign of the divisor.

use std::mem::size_of;

use ng_alloc::AllocError;

use super::{num, Num};
use crate::object::{ObjRef, TypeTag};
use crate::{RtResult, Runtime, RuntimeError};

const INT_DIVISION_BY_ZERO: &str = "integer division or modulo by zero";

/// Bytes needed for `count` copies of `len` elements of `width` bytes.
fn repeated_size(len: usize, count: usize, width: usize) -> RtResult<usize> {
    len.checked_mul(count)
        .and_then(|n| n.checked_mul(width))
        .filter(|&bytes| isize::try_from(bytes).is_ok())
        .ok_or_else(|| RuntimeError::Overflow {
            message: "repeated sequence is too long".to_owned(),
        })
}

impl Runtime {
    pub fn add(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        match (num(a), num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => {
                let sum = x.checked_add(y).ok_or_else(|| RuntimeError::overflow("+"))?;
                self.alloc_int(sum)
            }
            (Some(x), Some(y)) => self.alloc_float(x.as_f64() + y.as_f64()),
            _ => match (a.tag(), b.tag()) {
                (TypeTag::Str, TypeTag::Str) => self.cat_str(a, b),
                (TypeTag::Tuple, TypeTag::Tuple) => self.cat_tuple(a, b),
                (TypeTag::List, TypeTag::List) => {
                    let mut items = self.list_items(a)?.to_vec();
                    items.extend_from_slice(self.list_items(b)?);
                    self.list_from(&items)
                }
                _ => Err(self.unsupported("+", a, b)),
            },
        }
    }

    pub fn sub(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        match (num(a), num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => {
                let difference = x.checked_sub(y).ok_or_else(|| RuntimeError::overflow("-"))?;
                self.alloc_int(difference)
            }
            (Some(x), Some(y)) => self.alloc_float(x.as_f64() - y.as_f64()),
            _ => Err(self.unsupported("-", a, b)),
        }
    }

    pub fn mul(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        match (num(a), num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => {
                let product = x.checked_mul(y).ok_or_else(|| RuntimeError::overflow("*"))?;
                self.alloc_int(product)
            }
            (Some(x), Some(y)) => self.alloc_float(x.as_f64() * y.as_f64()),
            (None, Some(Num::Int(count))) => self.repeat(a, count, a, b),
            (Some(Num::Int(count)), None) => self.repeat(b, count, a, b),
            _ => Err(self.unsupported("*", a, b)),
        }
    }

    /// `sequence * count`; a negative count gives an empty sequence.
    fn repeat(&mut self, sequence: ObjRef, count: i64, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let count = usize::try_from(count).unwrap_or(0);
        match sequence.tag() {
            TypeTag::Str => {
                let text = self.to_c_string(sequence)?.into_owned();
                let total = repeated_size(text.len(), count, 1)?;
                let mut repeated = String::new();
                repeated
                    .try_reserve_exact(total)
                    .map_err(|_| AllocError::OutOfMemory { size: total })?;
                while repeated.len() < total {
                    repeated.push_str(&text);
                }
                self.alloc_str(&repeated)
            }
            TypeTag::List => {
                let items = self.list_items(sequence)?.to_vec();
                let total = repeated_size(items.len(), count, size_of::<ObjRef>())?;
                let mut repeated = Vec::new();
                repeated
                    .try_reserve_exact(total / size_of::<ObjRef>())
                    .map_err(|_| AllocError::OutOfMemory { size: total })?;
                while repeated.len() < total / size_of::<ObjRef>() {
                    repeated.extend_from_slice(&items);
                }
                self.list_from(&repeated)
            }
            _ => Err(self.unsupported("*", a, b)),
        }
    }

    /// `a / b`, always a float.
    pub fn true_div(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let (Some(x), Some(y)) = (num(a), num(b)) else {
            return Err(self.unsupported("/", a, b));
        };
        let divisor = y.as_f64();
        if divisor == 0.0 {
            return Err(RuntimeError::ZeroDivision {
                message: "division by zero",
            });
        }
        self.alloc_float(x.as_f64() / divisor)
    }

    /// `a // b`, rounded toward negative infinity.
    pub fn floor_div(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        match (num(a), num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => {
                if y == 0 {
                    return Err(RuntimeError::ZeroDivision {
                        message: INT_DIVISION_BY_ZERO,
                    });
                }
                let quotient = floor_div_int(x, y).ok_or_else(|| RuntimeError::overflow("//"))?;
                self.alloc_int(quotient)
            }
            (Some(x), Some(y)) => {
                let divisor = y.as_f64();
                if divisor == 0.0 {
                    return Err(RuntimeError::ZeroDivision {
                        message: "float floor division by zero",
                    });
                }
                self.alloc_float((x.as_f64() / divisor).floor())
            }
            _ => Err(self.unsupported("//", a, b)),
        }
    }

    /// `a % b`, with the sign of `b`.
    pub fn modulo(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        match (num(a), num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => {
                if y == 0 {
                    return Err(RuntimeError::ZeroDivision {
                        message: INT_DIVISION_BY_ZERO,
                    });
                }
                self.alloc_int(mod_int(x, y))
            }
            (Some(x), Some(y)) => {
                let divisor = y.as_f64();
                if divisor == 0.0 {
                    return Err(RuntimeError::ZeroDivision {
                        message: "float modulo",
                    });
                }
                self.alloc_float(mod_float(x.as_f64(), divisor))
            }
            _ => Err(self.unsupported("%", a, b)),
        }
    }

    /// `a ** b`. A negative int exponent gives a float.
    pub fn pow(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        match (num(a), num(b)) {
            (Some(Num::Int(base)), Some(Num::Int(exponent))) => match u64::try_from(exponent) {
                Ok(exponent) => {
                    let power = checked_pow(base, exponent)
                        .ok_or_else(|| RuntimeError::overflow("**"))?;
                    self.alloc_int(power)
                }
                Err(_) if base == 0 => Err(RuntimeError::ZeroDivision {
                    message: "0.0 cannot be raised to a negative power",
                }),
                Err(_) => {
                    let base = Num::Int(base).as_f64();
                    self.alloc_float(base.powf(Num::Int(exponent).as_f64()))
                }
            },
            (Some(base), Some(exponent)) => {
                let (base, exponent) = (base.as_f64(), exponent.as_f64());
                if base == 0.0 && exponent < 0.0 {
                    return Err(RuntimeError::ZeroDivision {
                        message: "0.0 cannot be raised to a negative power",
                    });
                }
                self.alloc_float(base.powf(exponent))
            }
            _ => Err(self.unsupported("**", a, b)),
        }
    }
}

/// Floor quotient; `None` on overflow (`i64::MIN // -1`).
pub(crate) fn floor_div_int(x: i64, y: i64) -> Option<i64> {
    let quotient = x.checked_div(y)?;
    if x % y != 0 && ((x < 0) != (y < 0)) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

pub(crate) fn mod_int(x: i64, y: i64) -> i64 {
    let remainder = x.wrapping_rem(y);
    if remainder != 0 && ((remainder < 0) != (y < 0)) {
        remainder + y
    } else {
        remainder
    }
}

pub(crate) fn mod_float(x: f64, y: f64) -> f64 {
    let remainder = x % y;
    if remainder != 0.0 && ((remainder < 0.0) != (y < 0.0)) {
        remainder + y
    } else {
        remainder
    }
}

/// Square-and-multiply with overflow detection.
pub(crate) fn checked_pow(mut base: i64, mut exponent: u64) -> Option<i64> {
    let mut result: i64 = 1;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.checked_mul(base)?;
        }
        exponent >>= 1;
        if exponent > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(result)
}
