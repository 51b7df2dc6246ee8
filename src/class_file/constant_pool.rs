use std::borrow::Cow ;
use super::ClassFileError ;
use super::bytes::{ ByteReader, ByteWriter };



/// A single constant pool entry.
///
/// Index operands are stored exactly as read. `Reserved` fills slot 0 and the
/// phantom slot that follows every `Long` and `Double`.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum Constant {
    /// Modified UTF-8 bytes, kept as read.
    Utf8( Box<[u8]> ),
    Integer( u32 ),
    Float( u32 ),
    Long( u64 ),
    Double( u64 ),
    Class( u16 ),
    String( u16 ),
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType( u16 ),
    Dynamic { bootstrap_method: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap_method: u16, name_and_type: u16 },
    Module( u16 ),
    Package( u16 ),
    Reserved,
}

impl Constant {

    const UTF8: u8 = 1 ;
    const INTEGER: u8 = 3 ;
    const FLOAT: u8 = 4 ;
    const LONG: u8 = 5 ;
    const DOUBLE: u8 = 6 ;
    const CLASS: u8 = 7 ;
    const STRING: u8 = 8 ;
    const FIELD_REF: u8 = 9 ;
    const METHOD_REF: u8 = 10 ;
    const INTERFACE_METHOD_REF: u8 = 11 ;
    const NAME_AND_TYPE: u8 = 12 ;
    const METHOD_HANDLE: u8 = 15 ;
    const METHOD_TYPE: u8 = 16 ;
    const DYNAMIC: u8 = 17 ;
    const INVOKE_DYNAMIC: u8 = 18 ;
    const MODULE: u8 = 19 ;
    const PACKAGE: u8 = 20 ;

    /// Whether the entry occupies two pool slots.
    #[inline] fn is_wide( &self ) -> bool { matches!( self, Self::Long( _ ) | Self::Double( _ ))}

    fn read( reader: &mut ByteReader<'_>, index: u16 ) -> Result<Self, ClassFileError> {
        let tag = reader.u8()?;
        Ok( match tag {
            Self::UTF8 => {
                let len = reader.u16()?;
                Self::Utf8( reader.bytes( usize::from( len ))?.into() )
            },
            Self::INTEGER => Self::Integer( reader.u32()? ),
            Self::FLOAT => Self::Float( reader.u32()? ),
            Self::LONG => Self::Long( reader.u64()? ),
            Self::DOUBLE => Self::Double( reader.u64()? ),
            Self::CLASS => Self::Class( reader.u16()? ),
            Self::STRING => Self::String( reader.u16()? ),
            Self::FIELD_REF => Self::FieldRef { class: reader.u16()?, name_and_type: reader.u16()? },
            Self::METHOD_REF => Self::MethodRef { class: reader.u16()?, name_and_type: reader.u16()? },
            Self::INTERFACE_METHOD_REF => Self::InterfaceMethodRef { class: reader.u16()?, name_and_type: reader.u16()? },
            Self::NAME_AND_TYPE => Self::NameAndType { name: reader.u16()?, descriptor: reader.u16()? },
            Self::METHOD_HANDLE => Self::MethodHandle { kind: reader.u8()?, reference: reader.u16()? },
            Self::METHOD_TYPE => Self::MethodType( reader.u16()? ),
            Self::DYNAMIC => Self::Dynamic { bootstrap_method: reader.u16()?, name_and_type: reader.u16()? },
            Self::INVOKE_DYNAMIC => Self::InvokeDynamic { bootstrap_method: reader.u16()?, name_and_type: reader.u16()? },
            Self::MODULE => Self::Module( reader.u16()? ),
            Self::PACKAGE => Self::Package( reader.u16()? ),
            tag => return Err( ClassFileError::InvalidConstantTag { tag, index }),
        })
    }

    fn write( &self, writer: &mut ByteWriter ) -> Result<(), ClassFileError> {
        match self {
            Self::Utf8( bytes ) => {
                writer.u8( Self::UTF8 );
                writer.len_u16( bytes.len(), "utf8 constant" )?;
                writer.bytes( bytes );
            },
            Self::Integer( value ) => { writer.u8( Self::INTEGER ); writer.u32( *value ); },
            Self::Float( value ) => { writer.u8( Self::FLOAT ); writer.u32( *value ); },
            Self::Long( value ) => { writer.u8( Self::LONG ); writer.u64( *value ); },
            Self::Double( value ) => { writer.u8( Self::DOUBLE ); writer.u64( *value ); },
            Self::Class( name ) => { writer.u8( Self::CLASS ); writer.u16( *name ); },
            Self::String( value ) => { writer.u8( Self::STRING ); writer.u16( *value ); },
            Self::FieldRef { class, name_and_type } => { writer.u8( Self::FIELD_REF ); writer.u16( *class ); writer.u16( *name_and_type ); },
            Self::MethodRef { class, name_and_type } => { writer.u8( Self::METHOD_REF ); writer.u16( *class ); writer.u16( *name_and_type ); },
            Self::InterfaceMethodRef { class, name_and_type } => { writer.u8( Self::INTERFACE_METHOD_REF ); writer.u16( *class ); writer.u16( *name_and_type ); },
            Self::NameAndType { name, descriptor } => { writer.u8( Self::NAME_AND_TYPE ); writer.u16( *name ); writer.u16( *descriptor ); },
            Self::MethodHandle { kind, reference } => { writer.u8( Self::METHOD_HANDLE ); writer.u8( *kind ); writer.u16( *reference ); },
            Self::MethodType( descriptor ) => { writer.u8( Self::METHOD_TYPE ); writer.u16( *descriptor ); },
            Self::Dynamic { bootstrap_method, name_and_type } => { writer.u8( Self::DYNAMIC ); writer.u16( *bootstrap_method ); writer.u16( *name_and_type ); },
            Self::InvokeDynamic { bootstrap_method, name_and_type } => { writer.u8( Self::INVOKE_DYNAMIC ); writer.u16( *bootstrap_method ); writer.u16( *name_and_type ); },
            Self::Module( name ) => { writer.u8( Self::MODULE ); writer.u16( *name ); },
            Self::Package( name ) => { writer.u8( Self::PACKAGE ); writer.u16( *name ); },
            Self::Reserved => {},
        }
        Ok(())
    }

}

/// The constant pool of a class file, indexed from 1.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self { Self { entries: vec![ Constant::Reserved ]}}
}

impl ConstantPool {

    /// Builds a pool from entries starting at index 1.
    pub(crate) fn from_entries( entries: impl IntoIterator<Item = Constant> ) -> Self {
        let mut pool = Self::default();
        pool.entries.extend( entries );
        pool
    }

    pub(crate) fn read( reader: &mut ByteReader<'_> ) -> Result<Self, ClassFileError> {
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity( usize::from( count ));
        entries.push( Constant::Reserved );
        let mut index = 1u16 ;
        while index < count {
            let constant = Constant::read( reader, index )?;
            let wide = constant.is_wide();
            // A long or double also occupies the following slot, which must exist.
            if wide && index + 1 >= count { return Err( ClassFileError::InvalidConstantIndex( index )) }
            entries.push( constant );
            if wide {
                entries.push( Constant::Reserved );
                index = index.saturating_add( 2 );
            } else {
                index += 1 ;
            }
        }
        Ok( Self { entries })
    }

    pub(crate) fn write( &self, writer: &mut ByteWriter ) -> Result<(), ClassFileError> {
        writer.len_u16( self.entries.len(), "constant pool" )?;
        self.entries.iter().skip( 1 ).try_for_each(| constant | constant.write( writer ))
    }

    /// The `constant_pool_count` value, one more than the highest valid index.
    #[inline] pub fn count( &self ) -> usize { self.entries.len() }

    /// The entry at `index`, `None` for index 0, phantom slots and out of range indices.
    pub fn get( &self, index: u16 ) -> Option<&Constant> {
        match self.entries.get( usize::from( index )) {
            None | Some( Constant::Reserved ) => None,
            Some( constant ) => Some( constant ),
        }
    }

    /// The raw modified UTF-8 bytes of a `CONSTANT_Utf8` entry.
    ///
    /// # Errors
    /// Fails if the index is invalid or names another kind of constant.
    pub fn utf8_bytes( &self, index: u16 ) -> Result<&[u8], ClassFileError> {
        match self.get( index ) {
            Some( Constant::Utf8( bytes )) => Ok( bytes ),
            Some( _ ) => Err( ClassFileError::UnexpectedConstant { index, expected: "Utf8" }),
            None => Err( ClassFileError::InvalidConstantIndex( index )),
        }
    }

    /// Borrows a `CONSTANT_Utf8` entry as text.
    ///
    /// Strings holding NUL or supplementary characters are not plain UTF-8 in
    /// class files and fail here; [`utf8_decoded`]( Self::utf8_decoded ) reads them.
    ///
    /// # Errors
    /// Fails if the index is invalid, names another kind of constant, or the bytes
    /// are not valid UTF-8.
    pub fn utf8( &self, index: u16 ) -> Result<&str, ClassFileError> {
        std::str::from_utf8( self.utf8_bytes( index )? ).map_err(|_| ClassFileError::InvalidUtf8( index ))
    }

    /// Decodes a `CONSTANT_Utf8` entry from modified UTF-8.
    ///
    /// # Errors
    /// Fails if the index is invalid, names another kind of constant, or the bytes
    /// are not valid modified UTF-8.
    pub fn utf8_decoded( &self, index: u16 ) -> Result<Cow<'_, str>, ClassFileError> {
        let bytes = self.utf8_bytes( index )?;
        match std::str::from_utf8( bytes ) {
            Ok( text ) => Ok( Cow::Borrowed( text )),
            Err( _ ) => decode_modified_utf8( bytes ).map( Cow::Owned ).ok_or( ClassFileError::InvalidUtf8( index )),
        }
    }

    /// Whether the `CONSTANT_Utf8` entry at `index` holds `value`.
    pub fn utf8_matches( &self, index: u16, value: &str ) -> bool {
        self.utf8_bytes( index ).is_ok_and(| bytes | *bytes == *encode_modified_utf8( value ))
    }

    /// Resolves a `CONSTANT_Class` entry to its internal name.
    ///
    /// # Errors
    /// Fails under the same conditions as [`utf8`]( Self::utf8 ) or if the entry is not a class.
    pub fn class_name( &self, index: u16 ) -> Result<&str, ClassFileError> {
        match self.get( index ) {
            Some( Constant::Class( name )) => self.utf8( *name ),
            Some( _ ) => Err( ClassFileError::UnexpectedConstant { index, expected: "Class" }),
            None => Err( ClassFileError::InvalidConstantIndex( index )),
        }
    }

    /// Returns the index of a `CONSTANT_Utf8` entry holding `value`, appending one if absent.
    ///
    /// # Errors
    /// Fails if the pool is full.
    pub fn intern_utf8( &mut self, value: &str ) -> Result<u16, ClassFileError> {
        let encoded = encode_modified_utf8( value );
        let existing = self.entries.iter().position(| constant | matches!(
            constant, Constant::Utf8( bytes ) if **bytes == *encoded
        ));
        match existing {
            Some( index ) => u16::try_from( index ).map_err(|_| ClassFileError::TooLarge( "constant pool" )),
            None => self.push( Constant::Utf8( encoded.into_owned().into() )),
        }
    }

    /// Returns the index of a `CONSTANT_Class` entry naming `internal_name`, appending one if absent.
    ///
    /// # Errors
    /// Fails if the pool is full.
    pub fn intern_class( &mut self, internal_name: &str ) -> Result<u16, ClassFileError> {
        let name = self.intern_utf8( internal_name )?;
        let existing = self.entries.iter().position(| constant | constant == &Constant::Class( name ));
        match existing {
            Some( index ) => u16::try_from( index ).map_err(|_| ClassFileError::TooLarge( "constant pool" )),
            None => self.push( Constant::Class( name )),
        }
    }

    fn push( &mut self, constant: Constant ) -> Result<u16, ClassFileError> {
        let index = u16::try_from( self.entries.len() )
            .ok()
            .filter(| index | *index < u16::MAX )
            .ok_or( ClassFileError::TooLarge( "constant pool" ))?;
        self.entries.push( constant );
        Ok( index )
    }

}

/// Encodes `value` the way class files store strings: NUL as `C0 80` and
/// supplementary characters as two three-byte surrogates.
fn encode_modified_utf8( value: &str ) -> Cow<'_, [u8]> {
    if !value.chars().any(| c | c == '\0' || u32::from( c ) > 0xFFFF ) {
        return Cow::Borrowed( value.as_bytes() );
    }
    let mut out = Vec::with_capacity( value.len() + 4 );
    for c in value.chars() {
        match c {
            '\0' => out.extend([ 0xC0, 0x80 ]),
            c if u32::from( c ) > 0xFFFF => {
                let mut units = [ 0u16 ; 2 ];
                for unit in c.encode_utf16( &mut units ) {
                    out.extend([ 0xE0 | low_byte( *unit >> 12 ), 0x80 | low_byte(( *unit >> 6 ) & 0x3F ), 0x80 | low_byte( *unit & 0x3F )]);
                }
            },
            c => out.extend_from_slice( c.encode_utf8( &mut [ 0 ; 4 ]).as_bytes() ),
        }
    }
    Cow::Owned( out )
}

fn decode_modified_utf8( bytes: &[u8] ) -> Option<String> {
    let mut units = Vec::with_capacity( bytes.len() );
    let mut rest = bytes ;
    while let Some(( &first, tail )) = rest.split_first() {
        let ( unit, tail ) = match ( first, tail ) {
            ( 0x01..=0x7F, tail ) => ( u16::from( first ), tail ),
            ( 0xC0..=0xDF, [ second, tail @ .. ]) if second & 0xC0 == 0x80 =>
                (( u16::from( first & 0x1F ) << 6 ) | u16::from( second & 0x3F ), tail ),
            ( 0xE0..=0xEF, [ second, third, tail @ .. ]) if second & 0xC0 == 0x80 && third & 0xC0 == 0x80 =>
                (( u16::from( first & 0x0F ) << 12 ) | ( u16::from( second & 0x3F ) << 6 ) | u16::from( third & 0x3F ), tail ),
            _ => return None,
        };
        units.push( unit );
        rest = tail ;
    }
    String::from_utf16( &units ).ok()
}

#[inline] fn low_byte( value: u16 ) -> u8 { value.to_be_bytes()[1] }
