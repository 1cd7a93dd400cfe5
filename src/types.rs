//! Value-type descriptors: base kind, pointer depth, array dimensions,
//! struct fields; size/alignment; compatibility rules.
//!
//! Grounded on `original_source/src/type.cpp`, restated as a total predicate
//! set (the original's `can_assign_from` silently fell off the end without a
//! `return` on some branches; every branch here is explicit).

use std::fmt;

/// The base kind of a type, independent of pointer depth or array shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Long,
    UInt,
    ULong,
    Double,
    Void,
    Char,
    Bool,
    Struct(String),
}

/// A single struct field: name, type, and byte offset from the struct base.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub offset: usize,
}

/// A full type descriptor: base kind, pointer depth, array dimensions, and
/// (for structs) an ordered field list.
///
/// Invariants (see spec.md §3):
/// - pointer depth and array dimensions are independent axes.
/// - field offsets are monotonically non-decreasing and respect each
///   field's natural alignment (min 1, max 8 bytes).
/// - `size()` of any pointer is always 8, regardless of pointee.
/// - array size is element size times the product of all dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub base: BaseType,
    pub ptr_depth: u32,
    pub array_dims: Vec<usize>,
    pub fields: Vec<Field>,
}

impl Type {
    pub fn new(base: BaseType) -> Self {
        Type {
            base,
            ptr_depth: 0,
            array_dims: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn void() -> Self {
        Type::new(BaseType::Void)
    }

    pub fn pointer_to(mut self) -> Self {
        self.ptr_depth += 1;
        self
    }

    pub fn pointee(&self) -> Type {
        debug_assert!(self.ptr_depth > 0);
        let mut t = self.clone();
        t.ptr_depth -= 1;
        t
    }

    pub fn with_array_dim(mut self, size: usize) -> Self {
        self.array_dims.push(size);
        self
    }

    /// The type of `a[i]` for an array-typed `a`: drop the outermost
    /// dimension, keeping any remaining ones.
    pub fn element_type(&self) -> Type {
        debug_assert!(self.is_array());
        let mut t = self.clone();
        t.array_dims.remove(0);
        t
    }

    pub fn is_pointer(&self) -> bool {
        self.ptr_depth > 0
    }

    pub fn is_array(&self) -> bool {
        !self.array_dims.is_empty()
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.base, BaseType::Struct(_)) && !self.is_pointer()
    }

    pub fn struct_name(&self) -> Option<&str> {
        match &self.base {
            BaseType::Struct(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Scalar size of one element of the *base* type, ignoring array
    /// dimensions and pointer depth (used internally by `size()`).
    fn base_size(&self) -> usize {
        match &self.base {
            BaseType::Bool | BaseType::Char => 1,
            BaseType::Int | BaseType::UInt => 4,
            BaseType::Long | BaseType::ULong | BaseType::Double => 8,
            BaseType::Void => 0,
            BaseType::Struct(_) => self.fields.iter().map(|f| f.ty.size()).sum(),
        }
    }

    /// Total size in bytes, per spec.md §4.3.
    pub fn size(&self) -> usize {
        if self.is_pointer() {
            return 8;
        }
        if self.is_array() {
            return self.base_size() * self.array_dims.iter().product::<usize>();
        }
        self.base_size()
    }

    pub fn is_size_8(&self) -> bool {
        self.size() == 8
    }

    pub fn is_integral(&self) -> bool {
        !self.is_pointer()
            && !self.is_array()
            && matches!(
                self.base,
                BaseType::Int | BaseType::UInt | BaseType::Long | BaseType::ULong
                    | BaseType::Char | BaseType::Bool
            )
    }

    pub fn is_floating(&self) -> bool {
        !self.is_pointer() && !self.is_array() && matches!(self.base, BaseType::Double)
    }

    pub fn is_signed(&self) -> bool {
        if self.is_pointer() || self.is_array() {
            return false;
        }
        matches!(self.base, BaseType::Int | BaseType::Long | BaseType::Char)
    }

    /// Round `current` up to the field's natural alignment (min 1, max 8),
    /// then append the field. Mirrors `Type::add_field`'s bit-trick exactly.
    pub fn add_field(&mut self, name: impl Into<String>, ty: Type) {
        let current = self
            .fields
            .last()
            .map(|f| f.offset + f.ty.size())
            .unwrap_or(0);
        let offset = Type::align_field_offset(current, &ty);
        self.fields.push(Field {
            name: name.into(),
            ty,
            offset,
        });
    }

    pub fn align_field_offset(current: usize, field_type: &Type) -> usize {
        let align = field_type.size().clamp(1, 8);
        (current + align - 1) & !(align - 1)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Assign-compatible: equality; or LHS is a pointer and RHS is a
    /// void-pointer or the integer constant `0`; or both are non-pointer and
    /// RHS widens to LHS (`int -> long`, `int|long -> double`).
    ///
    /// Total by construction: every branch below either returns `true` or
    /// falls through to the final `false`.
    pub fn assign_compatible(&self, other: &Type, rhs_is_zero_literal: bool) -> bool {
        if self == other {
            return true;
        }

        if self.is_pointer() {
            if other.is_pointer() && matches!(other.base, BaseType::Void) {
                return true;
            }
            if rhs_is_zero_literal && other.is_integral() && !other.is_pointer() {
                return true;
            }
            return false;
        }

        if !self.is_pointer() && !other.is_pointer() && !self.is_array() && !other.is_array() {
            if matches!(self.base, BaseType::Long | BaseType::ULong)
                && matches!(other.base, BaseType::Int | BaseType::UInt)
            {
                return true;
            }
            if matches!(self.base, BaseType::Double)
                && matches!(
                    other.base,
                    BaseType::Int | BaseType::UInt | BaseType::Long | BaseType::ULong
                )
            {
                return true;
            }
        }

        false
    }

    /// Convert-compatible: assign-compatible, or both are non-pointer
    /// non-array non-struct non-void scalars (an explicit cast is then
    /// required to actually perform the conversion).
    pub fn convert_compatible(&self, other: &Type, rhs_is_zero_literal: bool) -> bool {
        if self.assign_compatible(other, rhs_is_zero_literal) {
            return true;
        }
        if !self.is_pointer()
            && !other.is_pointer()
            && !self.is_array()
            && !other.is_array()
            && !matches!(self.base, BaseType::Void | BaseType::Struct(_))
            && !matches!(other.base, BaseType::Void | BaseType::Struct(_))
        {
            return true;
        }
        false
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            BaseType::Int => write!(f, "int")?,
            BaseType::Long => write!(f, "long")?,
            BaseType::UInt => write!(f, "unsigned int")?,
            BaseType::ULong => write!(f, "unsigned long")?,
            BaseType::Double => write!(f, "double")?,
            BaseType::Void => write!(f, "void")?,
            BaseType::Char => write!(f, "char")?,
            BaseType::Bool => write!(f, "bool")?,
            BaseType::Struct(name) => write!(f, "struct {name}")?,
        }
        for _ in 0..self.ptr_depth {
            write!(f, "*")?;
        }
        for dim in &self.array_dims {
            write!(f, "[{dim}]")?;
        }
        Ok(())
    }
}

/// Numeric binary-op promotion per spec.md §4.3: double beats long/ulong
/// beats int/uint; unsigned wins width ties.
pub fn promote_numeric(lhs: &Type, rhs: &Type) -> Type {
    if lhs.is_floating() || rhs.is_floating() {
        return Type::new(BaseType::Double);
    }
    let lhs_wide = lhs.is_size_8();
    let rhs_wide = rhs.is_size_8();
    if lhs_wide || rhs_wide {
        let unsigned = matches!(lhs.base, BaseType::ULong | BaseType::UInt)
            || matches!(rhs.base, BaseType::ULong | BaseType::UInt);
        return Type::new(if unsigned { BaseType::ULong } else { BaseType::Long });
    }
    let unsigned = matches!(lhs.base, BaseType::UInt) || matches!(rhs.base, BaseType::UInt);
    Type::new(if unsigned { BaseType::UInt } else { BaseType::Int })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_size_is_always_eight() {
        let t = Type::new(BaseType::Char).pointer_to();
        assert_eq!(t.size(), 8);
        let t2 = Type::new(BaseType::Struct("S".into())).pointer_to();
        assert_eq!(t2.size(), 8);
    }

    #[test]
    fn array_size_multiplies_dimensions() {
        let t = Type::new(BaseType::Int).with_array_dim(3).with_array_dim(4);
        assert_eq!(t.size(), 4 * 3 * 4);
    }

    #[test]
    fn struct_field_offsets_respect_alignment() {
        let mut s = Type::new(BaseType::Struct("Pair".into()));
        s.add_field("flag", Type::new(BaseType::Char)); // offset 0, size 1
        s.add_field("value", Type::new(BaseType::Long)); // aligned to 8 -> offset 8
        assert_eq!(s.field("flag").unwrap().offset, 0);
        assert_eq!(s.field("value").unwrap().offset, 8);
        // `size()` sums raw field sizes with no trailing padding, matching
        // `original_source/src/type.cpp`'s `get_size()`.
        assert_eq!(s.size(), 9);
    }

    #[test]
    fn assign_compatible_widening() {
        let long_t = Type::new(BaseType::Long);
        let int_t = Type::new(BaseType::Int);
        assert!(long_t.assign_compatible(&int_t, false));
        assert!(!int_t.assign_compatible(&long_t, false));
    }

    #[test]
    fn assign_compatible_pointer_from_zero_literal() {
        let ptr = Type::new(BaseType::Int).pointer_to();
        let zero = Type::new(BaseType::Int);
        assert!(ptr.assign_compatible(&zero, true));
        assert!(!ptr.assign_compatible(&zero, false));
    }

    #[test]
    fn assign_compatible_void_pointer() {
        let char_ptr = Type::new(BaseType::Char).pointer_to();
        let void_ptr = Type::new(BaseType::Void).pointer_to();
        assert!(char_ptr.assign_compatible(&void_ptr, false));
    }

    #[test]
    fn convert_compatible_requires_cast_between_scalars() {
        let double_t = Type::new(BaseType::Double);
        let int_t = Type::new(BaseType::Int);
        // int -> double is assign-compatible already (widening)
        assert!(double_t.assign_compatible(&int_t, false));
        // double -> int is not assign-compatible, but is convert-compatible
        assert!(!int_t.assign_compatible(&double_t, false));
        assert!(int_t.convert_compatible(&double_t, false));
    }

    #[test]
    fn struct_and_void_are_never_convert_compatible() {
        let s = Type::new(BaseType::Struct("S".into()));
        let v = Type::new(BaseType::Void);
        assert!(!s.convert_compatible(&v, false));
    }

    #[test]
    fn promote_numeric_prefers_double_then_width_then_unsigned() {
        assert_eq!(
            promote_numeric(&Type::new(BaseType::Int), &Type::new(BaseType::Double)).base,
            BaseType::Double
        );
        assert_eq!(
            promote_numeric(&Type::new(BaseType::Int), &Type::new(BaseType::Long)).base,
            BaseType::Long
        );
        assert_eq!(
            promote_numeric(&Type::new(BaseType::Int), &Type::new(BaseType::UInt)).base,
            BaseType::UInt
        );
    }
}
