//! An owned, structural view of a JVM class file.
//!
//! [`ClassNode::parse`] reads the full class file layout without interpreting
//! method bodies or attribute payloads; those are carried verbatim as [`Attribute`]s.
//! [`ClassNode::to_bytes`] writes the same layout back, so an unmodified node
//! serialises to exactly the bytes it was parsed from. This is enough for the
//! transformations that only touch access flags, constant pool entries and member
//! tables. Anything that rewrites bytecode belongs to the weaving engine.

use thiserror::Error ;

use crate::UnitName ;

mod access_flags ;
mod bytes ;
mod constant_pool ;

pub use access_flags::AccessFlags ;
pub use constant_pool::{ Constant, ConstantPool };

use bytes::{ ByteReader, ByteWriter };



/// Errors produced while reading or writing a class file.
#[derive( Debug, Error, Clone, PartialEq, Eq )]
pub enum ClassFileError {
	#[error( "Unexpected end of class file at offset {offset}" )] UnexpectedEof { offset: usize },
	#[error( "Bad magic number: {0:#010x}" )] BadMagic( u32 ),
	#[error( "Invalid constant tag {tag} at index {index}" )] InvalidConstantTag { tag: u8, index: u16 },
	#[error( "Invalid constant pool index: {0}" )] InvalidConstantIndex( u16 ),
	#[error( "Constant at index {index} is not {expected}" )] UnexpectedConstant { index: u16, expected: &'static str },
	#[error( "Constant at index {0} is not valid UTF-8" )] InvalidUtf8( u16 ),
	#[error( "{0} trailing bytes after class file" )] TrailingBytes( usize ),
	#[error( "Table too large to serialise: {0}" )] TooLarge( &'static str ),
}

/// An attribute whose payload is kept as raw bytes.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Attribute {
	pub name_index: u16,
	pub info: Box<[u8]>,
}

/// A field or method table entry.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct MemberNode {
	pub access: AccessFlags,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub attributes: Vec<Attribute>,
}

/// A parsed class file.
///
/// The node owns its [`ConstantPool`]; member names and descriptors are indices
/// into it and are resolved through [`member_name`]( Self::member_name ) and
/// [`member_descriptor`]( Self::member_descriptor ).
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct ClassNode {
	pub minor_version: u16,
	pub major_version: u16,
	pub constant_pool: ConstantPool,
	pub access: AccessFlags,
	pub this_class: u16,
	/// Zero for `java/lang/Object` and module descriptors.
	pub super_class: u16,
	pub interfaces: Vec<u16>,
	pub fields: Vec<MemberNode>,
	pub methods: Vec<MemberNode>,
	pub attributes: Vec<Attribute>,
}

impl ClassNode {

	const MAGIC: u32 = 0xCAFE_BABE ;
	const OBJECT: &'static str = "java/lang/Object" ;

	/// Class file version written by [`synthesize`]( Self::synthesize ).
	pub const SYNTHETIC_MAJOR_VERSION: u16 = 65 ;

	/// Reads a class file.
	///
	/// # Errors
	/// Fails on truncated input, a wrong magic number, unknown constant tags and
	/// bytes left over after the last attribute.
	pub fn parse( data: &[u8] ) -> Result<Self, ClassFileError> {
		let mut reader = ByteReader::new( data );
		let magic = reader.u32()?;
		if magic != Self::MAGIC { return Err( ClassFileError::BadMagic( magic )) }
		let minor_version = reader.u16()?;
		let major_version = reader.u16()?;
		let constant_pool = ConstantPool::read( &mut reader )?;
		let access = AccessFlags::from_bits_retain( reader.u16()? );
		let this_class = reader.u16()?;
		let super_class = reader.u16()?;
		let interface_count = reader.u16()?;
		let interfaces = ( 0..interface_count ).map(|_| reader.u16() ).collect::<Result<Vec<_>, _>>()?;
		let fields = read_members( &mut reader )?;
		let methods = read_members( &mut reader )?;
		let attributes = read_attributes( &mut reader )?;
		match reader.remaining() {
			0 => Ok( Self {
				minor_version, major_version, constant_pool, access, this_class,
				super_class, interfaces, fields, methods, attributes,
			}),
			trailing => Err( ClassFileError::TrailingBytes( trailing )),
		}
	}

	/// Writes the node back into class file form.
	///
	/// # Errors
	/// Fails if a table or payload grew beyond what the format can encode.
	pub fn to_bytes( &self ) -> Result<Vec<u8>, ClassFileError> {
		let mut writer = ByteWriter::with_capacity( 1024 );
		writer.u32( Self::MAGIC );
		writer.u16( self.minor_version );
		writer.u16( self.major_version );
		self.constant_pool.write( &mut writer )?;
		writer.u16( self.access.bits() );
		writer.u16( self.this_class );
		writer.u16( self.super_class );
		writer.len_u16( self.interfaces.len(), "interfaces" )?;
		self.interfaces.iter().for_each(| interface | writer.u16( *interface ));
		write_members( &mut writer, &self.fields, "fields" )?;
		write_members( &mut writer, &self.methods, "methods" )?;
		write_attributes( &mut writer, &self.attributes )?;
		Ok( writer.finish() )
	}

	/// An empty class named `name` that extends `java/lang/Object`.
	///
	/// Stands in for units that have no bytes yet and are generated by a
	/// transformation service.
	pub fn synthesize( name: &UnitName ) -> Self {
		let internal_name = name.internal_name();
		let constant_pool = ConstantPool::from_entries([
			Constant::Utf8( internal_name.as_bytes().into() ),
			Constant::Class( 1 ),
			Constant::Utf8( Self::OBJECT.as_bytes().into() ),
			Constant::Class( 3 ),
		]);
		Self {
			minor_version: 0,
			major_version: Self::SYNTHETIC_MAJOR_VERSION,
			constant_pool,
			access: AccessFlags::PUBLIC | AccessFlags::SUPER,
			this_class: 2,
			super_class: 4,
			interfaces: Vec::new(),
			fields: Vec::new(),
			methods: Vec::new(),
			attributes: Vec::new(),
		}
	}

	/// Internal name of the class, e.g. `com/example/Foo`.
	///
	/// # Errors
	/// Fails if `this_class` does not point at a class constant.
	pub fn name( &self ) -> Result<&str, ClassFileError> { self.constant_pool.class_name( self.this_class )}

	/// Internal name of the superclass, `None` if there is none.
	///
	/// # Errors
	/// Fails if `super_class` is non-zero and does not point at a class constant.
	pub fn super_name( &self ) -> Result<Option<&str>, ClassFileError> {
		match self.super_class {
			0 => Ok( None ),
			index => self.constant_pool.class_name( index ).map( Some ),
		}
	}

	#[inline] pub fn fields( &self ) -> &[MemberNode] { &self.fields }
	#[inline] pub fn methods( &self ) -> &[MemberNode] { &self.methods }

	/// # Errors
	/// Fails if the member's name index is not a UTF-8 constant.
	pub fn member_name( &self, member: &MemberNode ) -> Result<&str, ClassFileError> {
		self.constant_pool.utf8( member.name_index )
	}

	/// # Errors
	/// Fails if the member's descriptor index is not a UTF-8 constant.
	pub fn member_descriptor( &self, member: &MemberNode ) -> Result<&str, ClassFileError> {
		self.constant_pool.utf8( member.descriptor_index )
	}

	/// The first field named `name`.
	pub fn field_mut( &mut self, name: &str ) -> Option<&mut MemberNode> {
		let pool = &self.constant_pool ;
		self.fields.iter_mut()
			.find(| field | pool.utf8_matches( field.name_index, name ))
	}

	/// The method with the given name and descriptor.
	pub fn method_mut( &mut self, name: &str, descriptor: &str ) -> Option<&mut MemberNode> {
		let pool = &self.constant_pool ;
		self.methods.iter_mut().find(| method |
			pool.utf8_matches( method.name_index, name )
			&& pool.utf8_matches( method.descriptor_index, descriptor )
		)
	}

	/// Appends a field without attributes.
	///
	/// # Errors
	/// Fails if the constant pool is full.
	pub fn add_field( &mut self, access: AccessFlags, name: &str, descriptor: &str ) -> Result<&mut MemberNode, ClassFileError> {
		let member = self.new_member( access, name, descriptor )?;
		self.fields.push( member );
		let index = self.fields.len() - 1 ;
		Ok( &mut self.fields[index] )
	}

	/// Appends a method without attributes (and therefore without a body).
	///
	/// # Errors
	/// Fails if the constant pool is full.
	pub fn add_method( &mut self, access: AccessFlags, name: &str, descriptor: &str ) -> Result<&mut MemberNode, ClassFileError> {
		let member = self.new_member( access, name, descriptor )?;
		self.methods.push( member );
		let index = self.methods.len() - 1 ;
		Ok( &mut self.methods[index] )
	}

	fn new_member( &mut self, access: AccessFlags, name: &str, descriptor: &str ) -> Result<MemberNode, ClassFileError> {
		Ok( MemberNode {
			access,
			name_index: self.constant_pool.intern_utf8( name )?,
			descriptor_index: self.constant_pool.intern_utf8( descriptor )?,
			attributes: Vec::new(),
		})
	}

}

fn read_members( reader: &mut ByteReader<'_> ) -> Result<Vec<MemberNode>, ClassFileError> {
	let count = reader.u16()?;
	( 0..count ).map(|_| Ok( MemberNode {
		access: AccessFlags::from_bits_retain( reader.u16()? ),
		name_index: reader.u16()?,
		descriptor_index: reader.u16()?,
		attributes: read_attributes( reader )?,
	})).collect()
}

fn read_attributes( reader: &mut ByteReader<'_> ) -> Result<Vec<Attribute>, ClassFileError> {
	let count = reader.u16()?;
	( 0..count ).map(|_| {
		let name_index = reader.u16()?;
		let len = reader.u32()?;
		let len = usize::try_from( len ).map_err(|_| ClassFileError::TooLarge( "attribute" ))?;
		Ok( Attribute { name_index, info: reader.bytes( len )?.into() })
	}).collect()
}

fn write_members( writer: &mut ByteWriter, members: &[MemberNode], table: &'static str ) -> Result<(), ClassFileError> {
	writer.len_u16( members.len(), table )?;
	members.iter().try_for_each(| member | {
		writer.u16( member.access.bits() );
		writer.u16( member.name_index );
		writer.u16( member.descriptor_index );
		write_attributes( writer, &member.attributes )
	})
}

fn write_attributes( writer: &mut ByteWriter, attributes: &[Attribute] ) -> Result<(), ClassFileError> {
	writer.len_u16( attributes.len(), "attributes" )?;
	attributes.iter().try_for_each(| attribute | {
		writer.u16( attribute.name_index );
		writer.len_u32( attribute.info.len(), "attribute" )?;
		writer.bytes( &attribute.info );
		Ok(())
	})
}
