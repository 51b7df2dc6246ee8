use super::ClassFileError ;



/// Big-endian cursor over a class file.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {

    pub fn new( data: &'a [u8] ) -> Self { Self { data, offset: 0 }}

    #[inline] pub fn remaining( &self ) -> usize { self.data.len() - self.offset }

    pub fn bytes( &mut self, len: usize ) -> Result<&'a [u8], ClassFileError> {
        let end = self.offset.checked_add( len )
            .filter(| end | *end <= self.data.len() )
            .ok_or( ClassFileError::UnexpectedEof { offset: self.offset })?;
        let slice = &self.data[self.offset..end];
        self.offset = end ;
        Ok( slice )
    }

    pub fn u8( &mut self ) -> Result<u8, ClassFileError> {
        Ok( self.bytes( 1 )?[0] )
    }

    pub fn u16( &mut self ) -> Result<u16, ClassFileError> {
        let bytes = self.bytes( 2 )?;
        Ok( u16::from_be_bytes([ bytes[0], bytes[1] ]))
    }

    pub fn u32( &mut self ) -> Result<u32, ClassFileError> {
        let bytes = self.bytes( 4 )?;
        Ok( u32::from_be_bytes([ bytes[0], bytes[1], bytes[2], bytes[3] ]))
    }

    pub fn u64( &mut self ) -> Result<u64, ClassFileError> {
        let high = u64::from( self.u32()? );
        let low = u64::from( self.u32()? );
        Ok(( high << 32 ) | low )
    }

}

/// Big-endian writer mirroring [`ByteReader`].
pub(crate) struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {

    pub fn with_capacity( capacity: usize ) -> Self { Self { buffer: Vec::with_capacity( capacity )}}

    #[inline] pub fn u8( &mut self, value: u8 ) { self.buffer.push( value ); }
    #[inline] pub fn u16( &mut self, value: u16 ) { self.buffer.extend_from_slice( &value.to_be_bytes() ); }
    #[inline] pub fn u32( &mut self, value: u32 ) { self.buffer.extend_from_slice( &value.to_be_bytes() ); }
    #[inline] pub fn u64( &mut self, value: u64 ) { self.buffer.extend_from_slice( &value.to_be_bytes() ); }
    #[inline] pub fn bytes( &mut self, value: &[u8] ) { self.buffer.extend_from_slice( value ); }

    /// Writes a `u2` table length, failing if the table cannot be represented.
    pub fn len_u16( &mut self, len: usize, table: &'static str ) -> Result<(), ClassFileError> {
        let len = u16::try_from( len ).map_err(|_| ClassFileError::TooLarge( table ))?;
        self.u16( len );
        Ok(())
    }

    /// Writes a `u4` payload length, failing if the payload cannot be represented.
    pub fn len_u32( &mut self, len: usize, table: &'static str ) -> Result<(), ClassFileError> {
        let len = u32::try_from( len ).map_err(|_| ClassFileError::TooLarge( table ))?;
        self.u32( len );
        Ok(())
    }

    pub fn finish( self ) -> Vec<u8> { self.buffer }

}
